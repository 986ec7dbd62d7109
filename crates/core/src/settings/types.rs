use serde::{Deserialize, Serialize};

/// Fixed key under which the plugin settings record is stored.
pub const SETTINGS_KEY: &str = "transmit_order_csv_settings";

/// Status used when no trigger statuses are configured.
pub const DEFAULT_TRIGGER_STATUS: &str = "complete";

/// Persisted settings record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionSettings {
    /// Order statuses that trigger an automatic transmission.
    #[serde(default)]
    pub statuses: Vec<String>,
    /// Addresses the CSV is mailed to.
    #[serde(default)]
    pub csv_recipients: Vec<String>,
    /// Credential for a downstream integration, stored uppercased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl TransmissionSettings {
    /// Configured trigger statuses, falling back to `["complete"]` when none are set.
    pub fn trigger_statuses(&self) -> Vec<String> {
        if self.statuses.is_empty() {
            vec![DEFAULT_TRIGGER_STATUS.to_string()]
        } else {
            self.statuses.clone()
        }
    }
}

/// A settings field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
