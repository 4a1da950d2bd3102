use std::sync::Arc;

use serde::Serialize;

use crate::{
    dispense::error::{DispenseError, internal_error, not_found},
    inventory::{InventoryErrorKind, InventoryStore, Item, Machine},
    machine::MachineChannel,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockSlot {
    pub number: i32,
    pub item: Option<Item>,
    pub active: bool,
    pub count: Option<i32>,
    pub empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineStock {
    pub machine: Machine,
    pub is_online: bool,
    pub slots: Vec<StockSlot>,
}

/// Read-path sibling of the dispense flow: current stock for one machine or
/// all of them. An unreachable machine is reported offline with every slot
/// empty instead of failing the whole listing.
pub async fn list_stock(
    inventory: &Arc<dyn InventoryStore>,
    channel: &Arc<dyn MachineChannel>,
    machine_name: Option<&str>,
) -> Result<Vec<MachineStock>, DispenseError> {
    let machines = match machine_name {
        Some(name) => {
            let machine = inventory
                .get_machine(name)
                .await
                .map_err(|e| internal_error(e.message))?
                .ok_or_else(|| not_found(format!("the machine '{}' is not a valid machine", name)))?;
            vec![machine]
        }
        None => inventory
            .list_machines()
            .await
            .map_err(|e| internal_error(e.message))?,
    };

    let mut stocks = Vec::with_capacity(machines.len());
    for machine in machines {
        let slots = match inventory.list_slots(&machine.name).await {
            Ok(slots) => slots,
            Err(e) if e.kind == InventoryErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(internal_error(e.message)),
        };

        let (is_online, statuses) = match channel.poll_status(&machine).await {
            Ok(statuses) => (true, statuses),
            Err(err) => {
                tracing::debug!(
                    target: "dispense",
                    machine = %machine.name,
                    cause = %err,
                    "machine_offline_in_listing"
                );
                (false, Vec::new())
            }
        };

        let slots = slots
            .into_iter()
            .map(|slot| {
                let live_empty = statuses
                    .iter()
                    .find(|s| s.number == slot.number)
                    .map(|s| s.empty)
                    .unwrap_or(true);
                let empty =
                    !is_online || live_empty || slot.is_depleted() || !slot.active
                        || slot.item.is_none();
                StockSlot {
                    number: slot.number,
                    item: slot.item,
                    active: slot.active,
                    count: slot.count,
                    empty,
                }
            })
            .collect();

        stocks.push(MachineStock {
            machine,
            is_online,
            slots,
        });
    }

    Ok(stocks)
}
