use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::balance::{
    error::{BalanceError, conflict, unknown_user},
    store::{BalanceChange, BalanceStore},
};

/// Fixture balance store with the same compare-and-swap semantics as the
/// directory-backed one.
#[derive(Debug, Default)]
pub struct MemoryBalanceStore {
    balances: Mutex<HashMap<String, i64>>,
}

impl MemoryBalanceStore {
    pub fn with_balances<I, S>(balances: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            balances: Mutex::new(
                balances
                    .into_iter()
                    .map(|(uid, balance)| (uid.into(), balance))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl BalanceStore for MemoryBalanceStore {
    async fn read_balance(&self, uid: &str) -> Result<i64, BalanceError> {
        let balances = self.balances.lock().await;
        balances.get(uid).copied().ok_or_else(|| unknown_user(uid))
    }

    async fn write_balance(
        &self,
        uid: &str,
        new_balance: i64,
        expected_current: i64,
    ) -> Result<BalanceChange, BalanceError> {
        let mut balances = self.balances.lock().await;
        let current = balances.get_mut(uid).ok_or_else(|| unknown_user(uid))?;

        if *current != expected_current {
            return Err(conflict(format!(
                "balance for '{}' changed since it was read",
                uid
            )));
        }

        let old = *current;
        *current = new_balance;
        Ok(BalanceChange {
            old,
            new: new_balance,
        })
    }
}
