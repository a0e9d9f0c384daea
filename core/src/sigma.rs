//! Alarm service client built on `ServiceClient`.
//!
//! Covers receivers, alarms and status notification. Bodies are composed with
//! `serde_json`; URLs come from the shared builder with a `Target` per call.

use std::fmt;

use serde_json::json;

use crate::client::Transport;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::secrets::SecretSource;
use crate::service::ServiceClient;
use crate::transport::UreqTransport;
use crate::types::{Service, Target};
use crate::urls::service_key;

/// Status reported for an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmStatus {
    Ok,
    Warning,
    Critical,
    Stalled,
}

impl AlarmStatus {
    pub const ALL: [AlarmStatus; 4] = [
        AlarmStatus::Ok,
        AlarmStatus::Warning,
        AlarmStatus::Critical,
        AlarmStatus::Stalled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlarmStatus::Ok => "OK",
            AlarmStatus::Warning => "WARNING",
            AlarmStatus::Critical => "CRITICAL",
            AlarmStatus::Stalled => "STALLED",
        }
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an alarm receiver delivers notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmReceiverKind {
    Mail,
    Slack,
    SupportLevel1,
    Webhook,
}

impl AlarmReceiverKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlarmReceiverKind::Mail => "MAIL",
            AlarmReceiverKind::Slack => "SLACK",
            AlarmReceiverKind::SupportLevel1 => "SUPPORT_LEVEL1",
            AlarmReceiverKind::Webhook => "WEBHOOK",
        }
    }
}

impl fmt::Display for AlarmReceiverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection and action names used in alarm service URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigmaCollections {
    pub alarm_receivers: String,
    pub alarms: String,
    pub set_status: String,
}

impl Default for SigmaCollections {
    fn default() -> Self {
        Self {
            alarm_receivers: "alarm-receivers".to_string(),
            alarms: "alarms".to_string(),
            set_status: "setStatus".to_string(),
        }
    }
}

impl SigmaCollections {
    /// Names from `sigma.url.*` secrets, keeping the default for any that
    /// are empty.
    pub fn from_secrets(secrets: &dyn SecretSource, secret_name: &str) -> Self {
        let defaults = Self::default();
        let read = |name: &str, default: String| {
            let value = secrets.read(secret_name, &service_key(Service::Sigma, name));
            if value.is_empty() {
                default
            } else {
                value
            }
        };
        Self {
            alarm_receivers: read("alarm-receivers", defaults.alarm_receivers),
            alarms: read("alarms", defaults.alarms),
            set_status: read("setStatus", defaults.set_status),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SigmaService<T = UreqTransport> {
    client: ServiceClient<T>,
    collections: SigmaCollections,
}

impl SigmaService<UreqTransport> {
    pub fn from_secrets(secret_name: &str, secrets: &dyn SecretSource, config: &ClientConfig) -> Result<Self, Error> {
        let client = ServiceClient::from_secrets(Service::Sigma, secret_name, secrets, config)?;
        Ok(Self::new(client, SigmaCollections::from_secrets(secrets, secret_name)))
    }
}

impl<T: Transport> SigmaService<T> {
    pub fn new(client: ServiceClient<T>, collections: SigmaCollections) -> Self {
        Self { client, collections }
    }

    pub fn client(&self) -> &ServiceClient<T> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut ServiceClient<T> {
        &mut self.client
    }

    pub fn info(&self) -> Result<String, Error> {
        let url = format!("{}_service/info", self.client.urls().service_base_address(""));
        self.client.get(&url)
    }

    pub fn alarm_receivers(&self) -> Result<String, Error> {
        self.client.get(&self.receivers_url(""))
    }

    pub fn alarm_receiver(&self, id: &str) -> Result<String, Error> {
        self.client.get(&self.receivers_url(&format!("/{id}")))
    }

    /// Create a receiver. `receiver` is trimmed and lowercased, then checked
    /// against `kind`: mail needs an `@` (any domain), Slack and webhooks
    /// need an `https://` URL. A receiver failing its check yields an empty
    /// config.
    pub fn create_alarm_receiver(&self, id: &str, kind: AlarmReceiverKind, receiver: &str) -> Result<String, Error> {
        let body = alarm_receiver_body(id, kind, receiver);
        self.client.post(&self.receivers_url(""), &body)
    }

    pub fn delete_alarm_receiver(&self, id: &str) -> Result<String, Error> {
        self.client.delete(&self.receivers_url(&format!("/{id}")))
    }

    pub fn alarms(&self) -> Result<String, Error> {
        self.client.get(&self.alarms_url(""))
    }

    pub fn alarm(&self, id: &str) -> Result<String, Error> {
        self.client.get(&self.alarms_url(&format!("/{id}")))
    }

    pub fn delete_alarm(&self, id: &str) -> Result<String, Error> {
        self.client.delete(&self.alarms_url(&format!("/{id}")))
    }

    /// Notify `alarm_id` with `status`; `message` becomes the reason.
    pub fn send_status(&self, message: &str, status: AlarmStatus, alarm_id: &str) -> Result<String, Error> {
        let target = Target::collection(&self.collections.alarms)
            .named(alarm_id)
            .action(&self.collections.set_status);
        let body = json!({ "status": status.as_str(), "reason": message }).to_string();
        self.client
            .post(&self.client.urls().action_default_url(&target, ""), &body)
    }

    pub fn set_alarm_enabled(&self, alarm_id: &str, enabled: bool) -> Result<String, Error> {
        let target = Target::collection(&self.collections.alarms)
            .named(alarm_id)
            .action("setEnabled");
        let body = json!({ "enabled": enabled }).to_string();
        self.client
            .post(&self.client.urls().action_default_url(&target, ""), &body)
    }

    /// Resource path of a receiver as referenced from alarm type bodies.
    pub fn alarm_receiver_path(&self, id: &str) -> String {
        let e = self.client.urls().endpoint();
        format!(
            "//{}.{}{}/{}/{}/{id}",
            e.service_url_name, e.zone, e.ns_segment, e.namespace, self.collections.alarm_receivers
        )
    }

    fn receivers_url(&self, append: &str) -> String {
        let target = Target::collection(&self.collections.alarm_receivers);
        self.client.urls().common_service_url(&target, append)
    }

    fn alarms_url(&self, append: &str) -> String {
        let target = Target::collection(&self.collections.alarms);
        self.client.urls().common_service_url(&target, append)
    }
}

fn alarm_receiver_body(id: &str, kind: AlarmReceiverKind, receiver: &str) -> String {
    let receiver = receiver.trim().to_lowercase();
    let config = match kind {
        AlarmReceiverKind::Mail if receiver.contains('@') => json!({ "mail": receiver }),
        AlarmReceiverKind::Slack if receiver.starts_with("https://") => json!({ "webhook": receiver }),
        AlarmReceiverKind::Webhook if receiver.starts_with("https://") => json!({ "url": receiver }),
        _ => json!({}),
    };
    json!({ "_id": id, "kind": kind.as_str(), "config": config }).to_string()
}
