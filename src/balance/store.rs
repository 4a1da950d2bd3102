use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::balance::error::BalanceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub old: i64,
    pub new: i64,
}

/// Read/write of a user's credit balance. Owns balance persistence
/// exclusively; backed by the external directory in production and by an
/// in-memory map in the fixture implementation.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn read_balance(&self, uid: &str) -> Result<i64, BalanceError>;

    /// Compare-and-swap write: applies only while the stored balance still
    /// equals `expected_current`, otherwise fails with `Conflict`.
    async fn write_balance(
        &self,
        uid: &str,
        new_balance: i64,
        expected_current: i64,
    ) -> Result<BalanceChange, BalanceError>;
}
