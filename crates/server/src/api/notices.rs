use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use transmit_core::StagedNotice;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NoticesResponse {
    pub notices: Vec<StagedNotice>,
}

/// Hand out the pending admin notices. Each is returned once.
pub async fn drain_notices(State(state): State<Arc<AppState>>) -> Json<NoticesResponse> {
    Json(NoticesResponse {
        notices: state.notices().drain(),
    })
}
