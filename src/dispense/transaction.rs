use uuid::Uuid;

use crate::inventory::{Item, Machine, Slot};

/// State machine of one in-flight transaction. Strictly forward; `Aborted`
/// is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Received,
    Authorized,
    Validated,
    BalanceChecked,
    SlotLive,
    Dispensed,
    Settled,
    Aborted,
}

impl TxState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxState::Received => "received",
            TxState::Authorized => "authorized",
            TxState::Validated => "validated",
            TxState::BalanceChecked => "balance_checked",
            TxState::SlotLive => "slot_live",
            TxState::Dispensed => "dispensed",
            TxState::Settled => "settled",
            TxState::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Settled | TxState::Aborted)
    }
}

/// Ephemeral value object for one dispense transaction. Created at request
/// entry, destroyed at response; never persisted. The id only ties log lines
/// together for operator follow-up.
#[derive(Debug, Clone)]
pub struct DispenseTransaction {
    pub id: Uuid,
    pub uid: String,
    pub machine: Machine,
    pub slot: Slot,
    pub item: Item,
    pub balance_before: i64,
    pub balance_after: Option<i64>,
    state: TxState,
}

impl DispenseTransaction {
    pub fn new(uid: String, machine: Machine, slot: Slot, item: Item, balance_before: i64) -> Self {
        Self {
            id: Uuid::now_v7(),
            uid,
            machine,
            slot,
            item,
            balance_before,
            balance_after: None,
            state: TxState::BalanceChecked,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    pub fn advance(&mut self, next: TxState) {
        debug_assert!(!self.state.is_terminal(), "terminal state must not advance");
        tracing::debug!(
            target: "dispense",
            tx_id = %self.id,
            from = self.state.as_str(),
            to = next.as_str(),
            "transaction_transition"
        );
        self.state = next;
    }
}
