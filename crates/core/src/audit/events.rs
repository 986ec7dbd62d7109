use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Order lifecycle
    OrderStatusChanged {
        order_id: u64,
        /// Status before the transition (None for a previously unknown order)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from_status: Option<String>,
        to_status: String,
    },

    // Transmission events
    TransmissionAttempted {
        order_id: u64,
        order_number: String,
        status: String,
        /// "sent", "failed" or "skipped"
        outcome: String,
        recipients: usize,
        message: String,
    },
    /// A status event fired for an order that was already transmitted in that status.
    GuardSkipped {
        order_id: u64,
        status: String,
    },
    ManualTransmissionRequested {
        order_id: u64,
        requested_by: String,
        /// "order_action" or "ajax"
        surface: String,
    },

    // Settings
    SettingsUpdated {
        updated_by: String,
        statuses: Vec<String>,
        recipients: usize,
    },
}

impl AuditEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::OrderStatusChanged { .. } => "order_status_changed",
            Self::TransmissionAttempted { .. } => "transmission_attempted",
            Self::GuardSkipped { .. } => "guard_skipped",
            Self::ManualTransmissionRequested { .. } => "manual_transmission_requested",
            Self::SettingsUpdated { .. } => "settings_updated",
        }
    }

    pub fn order_id(&self) -> Option<u64> {
        match self {
            Self::OrderStatusChanged { order_id, .. }
            | Self::TransmissionAttempted { order_id, .. }
            | Self::GuardSkipped { order_id, .. }
            | Self::ManualTransmissionRequested { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::ManualTransmissionRequested { requested_by, .. } => Some(requested_by),
            Self::SettingsUpdated { updated_by, .. } => Some(updated_by),
            _ => None,
        }
    }
}

/// A stored audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub order_id: Option<u64>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}
