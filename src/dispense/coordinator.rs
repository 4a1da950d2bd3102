use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    auth::Principal,
    balance::{BalanceErrorKind, BalanceStore},
    dispense::{
        error::{
            DispenseError, ambiguous_outcome, bad_params, insufficient_balance, internal_error,
            internal_inconsistency, machine_rejected, machine_timed_out, machine_unreachable,
            not_found, slot_empty, unauthorized,
        },
        transaction::{DispenseTransaction, TxState},
    },
    inventory::InventoryStore,
    machine::{ChannelErrorKind, MachineChannel},
};

#[derive(Debug, Clone, Deserialize)]
pub struct DropRequest {
    pub machine: String,
    pub slot: i32,
    /// Required for trusted-machine callers; user callers default to their
    /// own username.
    #[serde(default)]
    pub uid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropReceipt {
    pub message: String,
    #[serde(rename = "drinkBalance")]
    pub drink_balance: i64,
}

/// The storage bindings for one inbound request. Exactly one inventory store
/// and one balance store are selected at the call site; they are never mixed
/// within a transaction.
pub struct RequestStores {
    pub inventory: Arc<dyn InventoryStore>,
    pub balance: Arc<dyn BalanceStore>,
}

/// Orchestrates the end-to-end dispense flow. Owns no persistent state, only
/// the in-flight transaction value during one request's execution.
pub struct TransactionCoordinator {
    channel: Arc<dyn MachineChannel>,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TransactionCoordinator {
    pub fn new(channel: Arc<dyn MachineChannel>) -> Self {
        Self {
            channel,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Serialization point per uid: concurrent requests for the same user
    /// queue here, so the balance snapshot cannot be spent twice.
    async fn user_lock(&self, uid: &str) -> Arc<Mutex<()>> {
        let mut guard = self.user_locks.lock().await;
        // A strong count of 1 means only the map holds the lock; no request
        // is in flight for that uid, so the entry can go. Keeps the map
        // bounded by the number of concurrent requests.
        guard.retain(|_, lock| Arc::strong_count(lock) > 1);
        guard
            .entry(uid.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn drop_drink(
        &self,
        stores: &RequestStores,
        principal: &Principal,
        request: &DropRequest,
    ) -> Result<DropReceipt, DispenseError> {
        let uid = resolve_uid(principal, request)?;
        validate_request(request)?;

        let lock = self.user_lock(&uid).await;
        let _guard = lock.lock().await;

        let result = self.run_transaction(stores, &uid, request).await;
        if let Err(err) = &result {
            match err.kind {
                crate::dispense::DispenseErrorKind::InternalInconsistency => {}
                _ => {
                    tracing::info!(
                        target: "dispense",
                        uid = %uid,
                        machine = %request.machine,
                        slot = request.slot,
                        code = err.code(),
                        "transaction_aborted"
                    );
                }
            }
        }
        result
    }

    async fn run_transaction(
        &self,
        stores: &RequestStores,
        uid: &str,
        request: &DropRequest,
    ) -> Result<DropReceipt, DispenseError> {
        // Received -> Authorized happened at the gate; Authorized ->
        // Validated resolves the machine, slot and item.
        let machine = stores
            .inventory
            .get_machine(&request.machine)
            .await
            .map_err(|e| internal_error(e.message))?
            .ok_or_else(|| {
                bad_params(format!("the machine '{}' is not a valid machine", request.machine))
            })?;

        let slots = stores
            .inventory
            .list_slots(&machine.name)
            .await
            .map_err(|e| internal_error(e.message))?;
        let slot = slots
            .into_iter()
            .find(|s| s.number == request.slot)
            .ok_or_else(|| {
                bad_params(format!(
                    "the machine '{}' does not have a slot number {}",
                    machine.name, request.slot
                ))
            })?;

        let item = slot.item.clone().ok_or_else(|| {
            bad_params(format!(
                "slot {} of '{}' is not loaded with an item",
                slot.number, machine.name
            ))
        })?;

        // Validated -> BalanceChecked: the snapshot read here is authoritative
        // for the remainder of the transaction and is never re-read.
        let balance_before = stores.balance.read_balance(uid).await.map_err(|e| {
            match e.kind {
                BalanceErrorKind::UnknownUser => not_found(e.message),
                _ => internal_error(e.message),
            }
        })?;

        let mut tx = DispenseTransaction::new(
            uid.to_string(),
            machine,
            slot,
            item,
            balance_before,
        );

        // BalanceChecked -> SlotLive: stored depletion aborts before any
        // network call; then the live report decides.
        if tx.slot.is_depleted() || !tx.slot.active {
            tx.advance(TxState::Aborted);
            return Err(slot_empty(format!(
                "slot {} of '{}' is empty",
                tx.slot.number, tx.machine.name
            )));
        }

        let statuses = match self.channel.poll_status(&tx.machine).await {
            Ok(statuses) => statuses,
            Err(err) => {
                tx.advance(TxState::Aborted);
                return Err(match err.kind {
                    ChannelErrorKind::Unreachable => machine_unreachable(err.message),
                    ChannelErrorKind::TimedOut => machine_timed_out(err.message),
                    ChannelErrorKind::Rejected => {
                        machine_rejected(err.status.unwrap_or(502), err.message)
                    }
                });
            }
        };

        // A slot the machine does not report is treated as empty: prefer a
        // false "empty" over an incorrect dispense.
        let live = statuses.iter().find(|s| s.number == tx.slot.number);
        if live.map(|s| s.empty).unwrap_or(true) {
            tx.advance(TxState::Aborted);
            return Err(slot_empty(format!(
                "slot {} of '{}' is empty",
                tx.slot.number, tx.machine.name
            )));
        }
        tx.advance(TxState::SlotLive);

        // The sufficiency gate sits strictly before the dispense command.
        if tx.balance_before < tx.item.price {
            tx.advance(TxState::Aborted);
            return Err(insufficient_balance(format!(
                "'{}' costs {} credits but '{}' has {}",
                tx.item.name, tx.item.price, tx.uid, tx.balance_before
            )));
        }

        // SlotLive -> Dispensed: one bounded attempt, no retries. A timeout
        // here is ambiguous: the machine may have dispensed and the response
        // was lost. No mutation is performed in that case.
        if let Err(err) = self.channel.dispense(&tx.machine, tx.slot.number).await {
            tx.advance(TxState::Aborted);
            return Err(match err.kind {
                ChannelErrorKind::Unreachable => machine_unreachable(err.message),
                ChannelErrorKind::TimedOut => {
                    tracing::warn!(
                        target: "dispense",
                        tx_id = %tx.id,
                        uid = %tx.uid,
                        machine = %tx.machine.name,
                        slot = tx.slot.number,
                        "dispense_outcome_ambiguous"
                    );
                    ambiguous_outcome(format!(
                        "dispense command to '{}' timed out; the physical outcome is unknown \
                         and no balance was deducted",
                        tx.machine.name
                    ))
                }
                ChannelErrorKind::Rejected => {
                    machine_rejected(err.status.unwrap_or(502), err.message)
                }
            });
        }
        tx.advance(TxState::Dispensed);

        // Dispensed -> Settled: debit and inventory bookkeeping happen only
        // here. A failure past this point means a user may have received an
        // item without being charged (or the stock counter is off); that is
        // fatal and must reach operators.
        let new_balance = tx.balance_before - tx.item.price;
        if let Err(err) = stores
            .balance
            .write_balance(&tx.uid, new_balance, tx.balance_before)
            .await
        {
            return Err(self.escalate_inconsistency(&tx, "balance debit", &err.message));
        }
        tx.balance_after = Some(new_balance);

        if tx.slot.count.is_some() {
            if let Err(err) = stores
                .inventory
                .adjust_slot_after_dispense(tx.machine.id, tx.slot.number)
                .await
            {
                return Err(self.escalate_inconsistency(&tx, "inventory decrement", &err.message));
            }
        }
        tx.advance(TxState::Settled);

        tracing::info!(
            target: "dispense",
            tx_id = %tx.id,
            uid = %tx.uid,
            machine = %tx.machine.name,
            slot = tx.slot.number,
            item_id = tx.item.id,
            price = tx.item.price,
            new_balance,
            "transaction_settled"
        );

        Ok(DropReceipt {
            message: format!(
                "dropped '{}' from slot {} of '{}'",
                tx.item.name, tx.slot.number, tx.machine.name
            ),
            drink_balance: new_balance,
        })
    }

    fn escalate_inconsistency(
        &self,
        tx: &DispenseTransaction,
        step: &str,
        cause: &str,
    ) -> DispenseError {
        tracing::error!(
            target: "dispense",
            tx_id = %tx.id,
            uid = %tx.uid,
            machine = %tx.machine.name,
            slot = tx.slot.number,
            step,
            cause,
            "settlement_inconsistency"
        );
        internal_inconsistency(format!(
            "{} failed after a confirmed dispense ({}); operator reconciliation required",
            step, cause
        ))
    }
}

fn resolve_uid(principal: &Principal, request: &DropRequest) -> Result<String, DispenseError> {
    match principal {
        Principal::TrustedMachine => request
            .uid
            .clone()
            .ok_or_else(|| bad_params("trusted-client drops must provide a uid")),
        Principal::User(claims) => match &request.uid {
            Some(uid) if uid != &claims.username => {
                Err(unauthorized("users cannot drop drinks on another user's credits"))
            }
            _ => Ok(claims.username.clone()),
        },
    }
}

fn validate_request(request: &DropRequest) -> Result<(), DispenseError> {
    let mut invalid = Vec::new();
    if request.machine.trim().is_empty() {
        invalid.push("machine");
    }
    if request.slot < 1 {
        invalid.push("slot");
    }
    if !invalid.is_empty() {
        return Err(bad_params(format!(
            "the following parameters were missing or invalid: {}",
            invalid.join(", ")
        )));
    }
    Ok(())
}
