use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use vendo::{
    auth::{Claims, Principal},
    balance::{
        BalanceChange, BalanceError, BalanceStore, MemoryBalanceStore,
        error::backend_error as balance_backend_error,
    },
    dispense::{DropRequest, RequestStores},
    inventory::{
        InventoryError, InventoryStore, Item, ItemPatch, Machine, MemoryInventoryStore, Slot,
        SlotPatch, SlotRecord, error::backend_error as inventory_backend_error,
    },
    machine::{ChannelError, MachineChannel, SlotStatus},
};

/// Channel double with scripted poll/dispense outcomes and call counters, so
/// tests can assert exactly how many network calls a transaction issued.
pub struct ScriptedChannel {
    default_poll: Result<Vec<SlotStatus>, ChannelError>,
    poll_overrides: HashMap<String, Result<Vec<SlotStatus>, ChannelError>>,
    dispense: Result<(), ChannelError>,
    pub polls: AtomicUsize,
    pub dispenses: AtomicUsize,
}

impl ScriptedChannel {
    pub fn new(
        poll: Result<Vec<SlotStatus>, ChannelError>,
        dispense: Result<(), ChannelError>,
    ) -> Self {
        Self {
            default_poll: poll,
            poll_overrides: HashMap::new(),
            dispense,
            polls: AtomicUsize::new(0),
            dispenses: AtomicUsize::new(0),
        }
    }

    pub fn with_poll_override(
        mut self,
        machine_name: &str,
        poll: Result<Vec<SlotStatus>, ChannelError>,
    ) -> Self {
        self.poll_overrides.insert(machine_name.to_string(), poll);
        self
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn dispense_count(&self) -> usize {
        self.dispenses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MachineChannel for ScriptedChannel {
    async fn poll_status(&self, machine: &Machine) -> Result<Vec<SlotStatus>, ChannelError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.poll_overrides
            .get(&machine.name)
            .unwrap_or(&self.default_poll)
            .clone()
    }

    async fn dispense(&self, _machine: &Machine, _slot_number: i32) -> Result<(), ChannelError> {
        self.dispenses.fetch_add(1, Ordering::SeqCst);
        self.dispense.clone()
    }
}

/// Balance store whose reads work but whose writes always fail, to exercise
/// settlement failures after a confirmed dispense.
pub struct WriteFailingBalanceStore {
    inner: MemoryBalanceStore,
}

impl WriteFailingBalanceStore {
    pub fn with_balances<I, S>(balances: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            inner: MemoryBalanceStore::with_balances(balances),
        }
    }
}

#[async_trait]
impl BalanceStore for WriteFailingBalanceStore {
    async fn read_balance(&self, uid: &str) -> Result<i64, BalanceError> {
        self.inner.read_balance(uid).await
    }

    async fn write_balance(
        &self,
        _uid: &str,
        _new_balance: i64,
        _expected_current: i64,
    ) -> Result<BalanceChange, BalanceError> {
        Err(balance_backend_error("directory write failed: connection reset"))
    }
}

/// Inventory store that behaves normally except the post-dispense counter
/// adjustment always fails.
pub struct AdjustFailingInventoryStore {
    inner: Arc<MemoryInventoryStore>,
}

impl AdjustFailingInventoryStore {
    pub fn new(inner: Arc<MemoryInventoryStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl InventoryStore for AdjustFailingInventoryStore {
    async fn get_machine(&self, name: &str) -> Result<Option<Machine>, InventoryError> {
        self.inner.get_machine(name).await
    }

    async fn list_machines(&self) -> Result<Vec<Machine>, InventoryError> {
        self.inner.list_machines().await
    }

    async fn list_slots(&self, machine_name: &str) -> Result<Vec<Slot>, InventoryError> {
        self.inner.list_slots(machine_name).await
    }

    async fn get_item(&self, id: i32) -> Result<Option<Item>, InventoryError> {
        self.inner.get_item(id).await
    }

    async fn list_items(&self) -> Result<Vec<Item>, InventoryError> {
        self.inner.list_items().await
    }

    async fn create_item(&self, name: &str, price: i64) -> Result<Item, InventoryError> {
        self.inner.create_item(name, price).await
    }

    async fn update_item(&self, id: i32, patch: ItemPatch) -> Result<Item, InventoryError> {
        self.inner.update_item(id, patch).await
    }

    async fn delete_item(&self, id: i32) -> Result<(), InventoryError> {
        self.inner.delete_item(id).await
    }

    async fn update_slot(
        &self,
        machine_name: &str,
        number: i32,
        patch: SlotPatch,
    ) -> Result<Slot, InventoryError> {
        self.inner.update_slot(machine_name, number, patch).await
    }

    async fn adjust_slot_after_dispense(
        &self,
        _machine_id: i32,
        _number: i32,
    ) -> Result<(), InventoryError> {
        Err(inventory_backend_error("postgres slot adjust failed: connection reset"))
    }
}

pub fn machine(id: i32, name: &str) -> Machine {
    Machine {
        id,
        name: name.to_string(),
        display_name: name.to_uppercase(),
    }
}

pub fn cola() -> Item {
    Item {
        id: 7,
        name: "Cola".to_string(),
        price: 100,
    }
}

/// One machine `m1` whose slot 3 holds item 7 at 100 credits.
pub fn inventory_fixture(count: Option<i32>) -> Arc<MemoryInventoryStore> {
    Arc::new(MemoryInventoryStore::with_fixture(
        vec![machine(1, "m1")],
        vec![cola()],
        vec![SlotRecord {
            machine_id: 1,
            number: 3,
            item_id: Some(7),
            active: true,
            count,
        }],
    ))
}

pub fn stores(
    inventory: Arc<MemoryInventoryStore>,
    balance: Arc<MemoryBalanceStore>,
) -> RequestStores {
    RequestStores {
        inventory,
        balance,
    }
}

pub fn user(username: &str) -> Principal {
    Principal::User(Claims {
        username: username.to_string(),
        groups: Vec::new(),
    })
}

pub fn drop_request(machine: &str, slot: i32) -> DropRequest {
    DropRequest {
        machine: machine.to_string(),
        slot,
        uid: None,
    }
}

pub fn full_slot_status() -> Vec<SlotStatus> {
    vec![SlotStatus {
        number: 3,
        empty: false,
    }]
}
