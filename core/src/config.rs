//! Client settings that are not service metadata.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const TIMEOUT_ENV: &str = "SEMAAS_REQUEST_TIMEOUT_MS";
pub const USER_AGENT_ENV: &str = "SEMAAS_USER_AGENT";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Whole-request timeout. `None` leaves the transport default in place.
    pub request_timeout_ms: Option<u64>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            user_agent: concat!("semaas-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Defaults overridden by `SEMAAS_REQUEST_TIMEOUT_MS` (`0` disables the
    /// timeout) and `SEMAAS_USER_AGENT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.request_timeout_ms = None,
                Ok(ms) => config.request_timeout_ms = Some(ms),
                Err(e) => warn!(value = %raw, error = %e, "ignoring unparsable {TIMEOUT_ENV}"),
            }
        }
        if let Some(agent) = lookup(USER_AGENT_ENV).filter(|a| !a.trim().is_empty()) {
            config.user_agent = agent;
        }
        config
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
