use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{
    inventory::Machine,
    machine::error::{ChannelError, rejected, timed_out, unreachable},
};

const MACHINE_TOKEN_HEADER: &str = "X-Auth-Token";

/// Live per-slot report parsed from a machine's raw status payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SlotStatus {
    pub number: i32,
    pub empty: bool,
}

#[derive(Debug, Deserialize)]
struct HealthReport {
    slots: Vec<SlotStatus>,
}

/// Outbound channel to one physical machine. Each call is attempted exactly
/// once; retries are a coordinator-level policy decision.
#[async_trait]
pub trait MachineChannel: Send + Sync {
    async fn poll_status(&self, machine: &Machine) -> Result<Vec<SlotStatus>, ChannelError>;

    async fn dispense(&self, machine: &Machine, slot_number: i32) -> Result<(), ChannelError>;
}

pub struct HttpMachineChannel {
    client: Client,
    url_template: String,
    machine_token: String,
    timeout: Duration,
}

impl HttpMachineChannel {
    pub fn new(
        url_template: impl Into<String>,
        machine_token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            url_template: url_template.into(),
            machine_token: machine_token.into(),
            timeout,
        }
    }

    /// Machine addresses derive deterministically from the internal name.
    fn base_url(&self, machine: &Machine) -> String {
        self.url_template.replace("{name}", &machine.name)
    }
}

fn map_transport_error(err: reqwest::Error, what: &str, machine: &str) -> ChannelError {
    if err.is_timeout() {
        timed_out(format!("machine '{}' {} timed out", machine, what))
    } else {
        unreachable(format!("machine '{}' {} failed: {}", machine, what, err))
    }
}

#[async_trait]
impl MachineChannel for HttpMachineChannel {
    async fn poll_status(&self, machine: &Machine) -> Result<Vec<SlotStatus>, ChannelError> {
        let url = format!("{}/health", self.base_url(machine).trim_end_matches('/'));

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| map_transport_error(err, "status poll", &machine.name))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(rejected(
                status,
                format!("machine '{}' refused status poll: {}", machine.name, body),
            ));
        }

        let report: HealthReport = response.json().await.map_err(|err| {
            unreachable(format!(
                "machine '{}' returned a malformed status report: {}",
                machine.name, err
            ))
        })?;

        Ok(report.slots)
    }

    async fn dispense(&self, machine: &Machine, slot_number: i32) -> Result<(), ChannelError> {
        let url = format!("{}/drop", self.base_url(machine).trim_end_matches('/'));

        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header(MACHINE_TOKEN_HEADER, &self.machine_token)
            .json(&json!({ "slot": slot_number }))
            .send()
            .await
            .map_err(|err| map_transport_error(err, "dispense command", &machine.name))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(rejected(
                status,
                format!("machine '{}' refused to dispense: {}", machine.name, body),
            ));
        }

        Ok(())
    }
}
