pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod types;

pub use error::{InventoryError, InventoryErrorKind};
pub use memory::MemoryInventoryStore;
pub use postgres::PgInventoryStore;
pub use store::{InventoryStore, StoreSelector};
pub use types::{Item, ItemPatch, Machine, Slot, SlotPatch, SlotRecord};
