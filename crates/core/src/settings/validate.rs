//! Settings-form sanitization and validation.

use super::{FieldError, SettingsError, TransmissionSettings};

/// Longest accepted `api_key`, in characters.
pub const MAX_API_KEY_LEN: usize = 20;

/// Normalize a submitted settings record before it is stored.
///
/// Uppercases `api_key`, trims list entries and drops blank ones.
pub fn sanitize_settings(mut settings: TransmissionSettings) -> TransmissionSettings {
    settings.api_key = settings.api_key.map(|key| key.to_uppercase());
    settings.statuses = clean_list(settings.statuses);
    settings.csv_recipients = clean_list(settings.csv_recipients);
    settings
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Collect every invalid field of a submitted settings record.
pub fn validate_settings(settings: &TransmissionSettings) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(key) = &settings.api_key {
        if key.chars().count() > MAX_API_KEY_LEN {
            errors.push(field_error("api_key"));
        }
    }

    errors
}

fn field_error(field: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: format!(
            "Looks like you made a mistake with the {} field. Make sure it isn't longer than {} characters",
            field, MAX_API_KEY_LEN
        ),
    }
}

/// Validate then sanitize a submitted record, the order the settings form applies them.
pub fn prepare_settings_update(
    submitted: TransmissionSettings,
) -> Result<TransmissionSettings, SettingsError> {
    let errors = validate_settings(&submitted);
    if !errors.is_empty() {
        return Err(SettingsError::Validation(errors));
    }
    Ok(sanitize_settings(submitted))
}
