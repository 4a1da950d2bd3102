use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::balance::{
    error::{BalanceError, backend_error, conflict, unknown_user},
    store::{BalanceChange, BalanceStore},
};

#[derive(Debug, Deserialize)]
struct BalanceBody {
    balance: i64,
}

#[derive(Debug, Deserialize)]
struct BalanceChangeBody {
    old: i64,
    new: i64,
}

/// Balance storage in the external identity/credential directory, consumed as
/// a black-box read / compare-and-write keyed by uid.
pub struct DirectoryBalanceStore {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl DirectoryBalanceStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    fn balance_url(&self, uid: &str) -> String {
        format!("{}/users/{}/balance", self.base_url.trim_end_matches('/'), uid)
    }
}

#[async_trait]
impl BalanceStore for DirectoryBalanceStore {
    async fn read_balance(&self, uid: &str) -> Result<i64, BalanceError> {
        let response = self
            .client
            .get(self.balance_url(uid))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| backend_error(format!("directory read failed: {}", err)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(unknown_user(uid)),
            status if status.is_success() => {
                let body: BalanceBody = response.json().await.map_err(|err| {
                    backend_error(format!("malformed directory response: {}", err))
                })?;
                Ok(body.balance)
            }
            status => Err(backend_error(format!(
                "directory read returned status {}",
                status.as_u16()
            ))),
        }
    }

    async fn write_balance(
        &self,
        uid: &str,
        new_balance: i64,
        expected_current: i64,
    ) -> Result<BalanceChange, BalanceError> {
        let response = self
            .client
            .put(self.balance_url(uid))
            .timeout(self.timeout)
            .json(&json!({ "balance": new_balance, "expected": expected_current }))
            .send()
            .await
            .map_err(|err| backend_error(format!("directory write failed: {}", err)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(unknown_user(uid)),
            StatusCode::CONFLICT => Err(conflict(format!(
                "balance for '{}' changed since it was read",
                uid
            ))),
            status if status.is_success() => {
                let body: BalanceChangeBody = response.json().await.map_err(|err| {
                    backend_error(format!("malformed directory response: {}", err))
                })?;
                Ok(BalanceChange {
                    old: body.old,
                    new: body.new,
                })
            }
            status => Err(backend_error(format!(
                "directory write returned status {}",
                status.as_u16()
            ))),
        }
    }
}
