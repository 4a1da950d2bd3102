pub mod coordinator;
pub mod error;
pub mod listing;
pub mod transaction;

pub use coordinator::{DropReceipt, DropRequest, RequestStores, TransactionCoordinator};
pub use error::{DispenseError, DispenseErrorKind};
pub use listing::{MachineStock, StockSlot, list_stock};
pub use transaction::{DispenseTransaction, TxState};
