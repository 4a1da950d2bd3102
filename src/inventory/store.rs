use async_trait::async_trait;
use serde::Deserialize;

use crate::inventory::{
    error::InventoryError,
    types::{Item, ItemPatch, Machine, Slot, SlotPatch},
};

/// Which concrete store a request is bound to. Exactly one implementation is
/// selected per inbound request; implementations are never mixed within a
/// single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreSelector {
    #[default]
    Persistent,
    Fixture,
}

/// Uniform interface over inventory data. Owns Machine/Item/Slot persistence
/// exclusively.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn get_machine(&self, name: &str) -> Result<Option<Machine>, InventoryError>;

    async fn list_machines(&self) -> Result<Vec<Machine>, InventoryError>;

    /// Slots of a machine, ordered by slot number ascending, each hydrated
    /// with its referenced item. Unknown machine is `NotFound`.
    async fn list_slots(&self, machine_name: &str) -> Result<Vec<Slot>, InventoryError>;

    async fn get_item(&self, id: i32) -> Result<Option<Item>, InventoryError>;

    async fn list_items(&self) -> Result<Vec<Item>, InventoryError>;

    async fn create_item(&self, name: &str, price: i64) -> Result<Item, InventoryError>;

    /// Applies only the fields present in the patch. Unknown id is `NotFound`.
    async fn update_item(&self, id: i32, patch: ItemPatch) -> Result<Item, InventoryError>;

    async fn delete_item(&self, id: i32) -> Result<(), InventoryError>;

    async fn update_slot(
        &self,
        machine_name: &str,
        number: i32,
        patch: SlotPatch,
    ) -> Result<Slot, InventoryError>;

    /// Post-dispense bookkeeping: decrement a metered slot's count, clearing
    /// `active` when it reaches zero. Unmetered slots are untouched.
    async fn adjust_slot_after_dispense(
        &self,
        machine_id: i32,
        number: i32,
    ) -> Result<(), InventoryError>;
}
