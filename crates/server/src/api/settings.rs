//! The plugin settings form.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use transmit_core::{
    load_transmission_settings, prepare_settings_update, save_transmission_settings, AuditEvent,
    FieldError, SettingsError, TransmissionSettings,
};

use super::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub settings: TransmissionSettings,
    /// Statuses currently bound to the guarded transmission
    pub bound_statuses: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SettingsErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

fn settings_error(e: SettingsError) -> (StatusCode, Json<SettingsErrorResponse>) {
    match e {
        SettingsError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(SettingsErrorResponse {
                error: "Settings validation failed".to_string(),
                errors,
            }),
        ),
        e => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SettingsErrorResponse {
                error: e.to_string(),
                errors: Vec::new(),
            }),
        ),
    }
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    load_transmission_settings(state.settings())
        .map(|settings| {
            Json(SettingsResponse {
                settings,
                bound_statuses: state.registry().bound_statuses(),
            })
        })
        .map_err(settings_error)
}

/// Validate, sanitize and store a submitted settings record.
///
/// Trigger statuses take effect immediately.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(submitted): Json<TransmissionSettings>,
) -> Result<Json<SettingsResponse>, (StatusCode, Json<SettingsErrorResponse>)> {
    let settings = prepare_settings_update(submitted).map_err(settings_error)?;
    save_transmission_settings(state.settings(), &settings).map_err(settings_error)?;

    let bound = state.registry().rebind(&settings.statuses);
    info!(updated_by = %user_id, statuses = bound, "Transmission settings updated");

    state
        .audit()
        .emit(AuditEvent::SettingsUpdated {
            updated_by: user_id,
            statuses: settings.statuses.clone(),
            recipients: settings.csv_recipients.len(),
        })
        .await;

    Ok(Json(SettingsResponse {
        settings,
        bound_statuses: state.registry().bound_statuses(),
    }))
}
