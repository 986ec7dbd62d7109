use serde_json::Value;
use thiserror::Error;

use super::{FieldError, TransmissionSettings, SETTINGS_KEY};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Settings validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
}

/// Flat key-value option storage.
pub trait SettingsStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &Value) -> Result<(), SettingsError>;
}

/// Read the plugin settings record, defaulting when it was never saved.
pub fn load_transmission_settings(
    store: &dyn SettingsStore,
) -> Result<TransmissionSettings, SettingsError> {
    match store.get(SETTINGS_KEY)? {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| SettingsError::Serialization(e.to_string())),
        None => Ok(TransmissionSettings::default()),
    }
}

/// Persist the plugin settings record.
pub fn save_transmission_settings(
    store: &dyn SettingsStore,
    settings: &TransmissionSettings,
) -> Result<(), SettingsError> {
    let value =
        serde_json::to_value(settings).map_err(|e| SettingsError::Serialization(e.to_string()))?;
    store.set(SETTINGS_KEY, &value)
}

/// Persist `settings` only if nothing is stored yet. Returns whether it wrote.
pub fn seed_transmission_settings(
    store: &dyn SettingsStore,
    settings: &TransmissionSettings,
) -> Result<bool, SettingsError> {
    if store.get(SETTINGS_KEY)?.is_some() {
        return Ok(false);
    }
    save_transmission_settings(store, settings)?;
    Ok(true)
}
