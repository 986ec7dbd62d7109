//! Types for the transmit module.

use serde::{Deserialize, Serialize};

use crate::config::MailConfig;
use crate::order::{Order, OrderId};
use crate::settings::{load_transmission_settings, SettingsError, SettingsStore, TransmissionSettings};

/// An order given either by id or already loaded.
#[derive(Debug, Clone)]
pub enum OrderRef {
    Id(OrderId),
    Loaded(Box<Order>),
}

impl OrderRef {
    pub fn id(&self) -> OrderId {
        match self {
            Self::Id(id) => *id,
            Self::Loaded(order) => order.id,
        }
    }
}

impl From<OrderId> for OrderRef {
    fn from(id: OrderId) -> Self {
        Self::Id(id)
    }
}

impl From<u64> for OrderRef {
    fn from(id: u64) -> Self {
        Self::Id(OrderId(id))
    }
}

impl From<Order> for OrderRef {
    fn from(order: Order) -> Self {
        Self::Loaded(Box::new(order))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransmissionOutcome {
    /// The mail transport accepted the message.
    Sent,
    /// The mail transport reported a failure.
    Failed,
    /// Nothing was mailed: unknown order, no recipients, or already sent.
    Skipped,
}

impl TransmissionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Outcome of one pipeline run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionResult {
    pub order_id: OrderId,
    pub outcome: TransmissionOutcome,
    pub message: String,
}

impl TransmissionResult {
    pub fn sent(order_id: OrderId, message: impl Into<String>) -> Self {
        Self::new(order_id, TransmissionOutcome::Sent, message)
    }

    pub fn failed(order_id: OrderId, message: impl Into<String>) -> Self {
        Self::new(order_id, TransmissionOutcome::Failed, message)
    }

    pub fn skipped(order_id: OrderId, message: impl Into<String>) -> Self {
        Self::new(order_id, TransmissionOutcome::Skipped, message)
    }

    fn new(order_id: OrderId, outcome: TransmissionOutcome, message: impl Into<String>) -> Self {
        Self {
            order_id,
            outcome,
            message: message.into(),
        }
    }
}

/// Trigger statuses and recipients as read at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionConfig {
    /// Never empty: falls back to `["complete"]`.
    pub trigger_statuses: Vec<String>,
    pub recipients: Vec<String>,
}

impl TransmissionConfig {
    pub fn load(store: &dyn SettingsStore) -> Result<Self, SettingsError> {
        load_transmission_settings(store).map(|settings| Self::from(&settings))
    }
}

impl From<&TransmissionSettings> for TransmissionConfig {
    fn from(settings: &TransmissionSettings) -> Self {
        Self {
            trigger_statuses: settings.trigger_statuses(),
            recipients: settings.csv_recipients.clone(),
        }
    }
}

/// Display name and address for the `From` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

impl Sender {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl From<&MailConfig> for Sender {
    fn from(config: &MailConfig) -> Self {
        Self::new(&config.from_name, &config.from_address)
    }
}
