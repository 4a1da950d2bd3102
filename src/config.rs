use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pre-shared secret presented by trusted-machine callers and attached to
    /// outbound dispense commands.
    pub machine_token: String,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Postgres URL for the persistent inventory store. Absent in
    /// fixture-only deployments.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub machines: MachineNetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_userinfo_url() -> String {
    "https://sso.example.org/auth/realms/members/protocol/openid-connect/userinfo".to_string()
}

fn default_admin_group() -> String {
    "drink".to_string()
}

fn default_directory_base_url() -> String {
    "http://directory.internal:8080".to_string()
}

fn default_machine_url_template() -> String {
    "http://{name}.machines.internal:8080".to_string()
}

fn default_machine_timeout_secs() -> u64 {
    5
}

fn default_logging_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Token-introspection endpoint of the identity provider.
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
    /// Group membership claim required for admin-only operations.
    #[serde(default = "default_admin_group")]
    pub admin_group: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            userinfo_url: default_userinfo_url(),
            admin_group: default_admin_group(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_directory_base_url")]
    pub base_url: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_directory_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineNetConfig {
    /// Address template for physical machines; `{name}` is replaced with the
    /// machine's internal name.
    #[serde(default = "default_machine_url_template")]
    pub url_template: String,
    #[serde(default = "default_machine_timeout_secs")]
    pub timeout_secs: u64,
}

impl MachineNetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for MachineNetConfig {
    fn default() -> Self {
        Self {
            url_template: default_machine_url_template(),
            timeout_secs: default_machine_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_logging_filter(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Config = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        if config.machine_token.trim().is_empty() {
            anyhow::bail!("machine_token cannot be empty");
        }

        Ok(config)
    }
}
