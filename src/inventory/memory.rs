use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::inventory::{
    error::{InventoryError, not_found},
    store::InventoryStore,
    types::{Item, ItemPatch, Machine, Slot, SlotPatch, SlotRecord},
};

#[derive(Debug, Default)]
struct Inner {
    machines: Vec<Machine>,
    items: Vec<Item>,
    slots: Vec<SlotRecord>,
}

/// Fixture store over in-process data. Explicitly owned and dependency
/// injected; each instance is scoped to the run or test that created it.
#[derive(Debug, Default)]
pub struct MemoryInventoryStore {
    inner: Mutex<Inner>,
}

impl MemoryInventoryStore {
    pub fn with_fixture(
        machines: Vec<Machine>,
        items: Vec<Item>,
        slots: Vec<SlotRecord>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                machines,
                items,
                slots,
            }),
        }
    }

    /// Raw slot row, for asserting post-dispense state in tests.
    pub async fn slot_record(&self, machine_id: i32, number: i32) -> Option<SlotRecord> {
        let inner = self.inner.lock().await;
        inner
            .slots
            .iter()
            .find(|s| s.machine_id == machine_id && s.number == number)
            .cloned()
    }
}

fn hydrate(record: &SlotRecord, items: &[Item]) -> Slot {
    let item = record
        .item_id
        .and_then(|id| items.iter().find(|i| i.id == id).cloned());
    Slot {
        machine_id: record.machine_id,
        number: record.number,
        item,
        active: record.active,
        count: record.count,
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn get_machine(&self, name: &str) -> Result<Option<Machine>, InventoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.machines.iter().find(|m| m.name == name).cloned())
    }

    async fn list_machines(&self) -> Result<Vec<Machine>, InventoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.machines.clone())
    }

    async fn list_slots(&self, machine_name: &str) -> Result<Vec<Slot>, InventoryError> {
        let inner = self.inner.lock().await;
        let machine = inner
            .machines
            .iter()
            .find(|m| m.name == machine_name)
            .ok_or_else(|| not_found(format!("no machine named '{}'", machine_name)))?;

        let mut slots: Vec<Slot> = inner
            .slots
            .iter()
            .filter(|s| s.machine_id == machine.id)
            .map(|s| hydrate(s, &inner.items))
            .collect();
        slots.sort_by_key(|s| s.number);
        Ok(slots)
    }

    async fn get_item(&self, id: i32) -> Result<Option<Item>, InventoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.items.iter().find(|i| i.id == id).cloned())
    }

    async fn list_items(&self) -> Result<Vec<Item>, InventoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.items.clone())
    }

    async fn create_item(&self, name: &str, price: i64) -> Result<Item, InventoryError> {
        let mut inner = self.inner.lock().await;
        let next_id = inner.items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        let item = Item {
            id: next_id,
            name: name.to_string(),
            price,
        };
        inner.items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: i32, patch: ItemPatch) -> Result<Item, InventoryError> {
        let mut inner = self.inner.lock().await;
        let item = inner
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found(format!("no item with id {}", id)))?;

        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        Ok(item.clone())
    }

    async fn delete_item(&self, id: i32) -> Result<(), InventoryError> {
        let mut inner = self.inner.lock().await;
        let before = inner.items.len();
        inner.items.retain(|i| i.id != id);
        if inner.items.len() == before {
            return Err(not_found(format!("no item with id {}", id)));
        }
        Ok(())
    }

    async fn update_slot(
        &self,
        machine_name: &str,
        number: i32,
        patch: SlotPatch,
    ) -> Result<Slot, InventoryError> {
        let mut inner = self.inner.lock().await;
        let machine_id = inner
            .machines
            .iter()
            .find(|m| m.name == machine_name)
            .map(|m| m.id)
            .ok_or_else(|| not_found(format!("no machine named '{}'", machine_name)))?;

        let Inner { slots, items, .. } = &mut *inner;
        let record = slots
            .iter_mut()
            .find(|s| s.machine_id == machine_id && s.number == number)
            .ok_or_else(|| {
                not_found(format!(
                    "machine '{}' has no slot number {}",
                    machine_name, number
                ))
            })?;

        if let Some(item_id) = patch.item_id {
            record.item_id = Some(item_id);
        }
        if let Some(active) = patch.active {
            record.active = active;
        }
        if let Some(count) = patch.count {
            record.count = count;
        }
        Ok(hydrate(record, items))
    }

    async fn adjust_slot_after_dispense(
        &self,
        machine_id: i32,
        number: i32,
    ) -> Result<(), InventoryError> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .slots
            .iter_mut()
            .find(|s| s.machine_id == machine_id && s.number == number)
            .ok_or_else(|| {
                not_found(format!(
                    "machine {} has no slot number {}",
                    machine_id, number
                ))
            })?;

        if let Some(count) = record.count {
            let remaining = count.saturating_sub(1);
            record.count = Some(remaining);
            if remaining == 0 {
                record.active = false;
            }
        }
        Ok(())
    }
}
