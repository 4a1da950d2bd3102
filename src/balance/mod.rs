pub mod directory;
pub mod error;
pub mod memory;
pub mod store;

pub use directory::DirectoryBalanceStore;
pub use error::{BalanceError, BalanceErrorKind};
pub use memory::MemoryBalanceStore;
pub use store::{BalanceChange, BalanceStore};
