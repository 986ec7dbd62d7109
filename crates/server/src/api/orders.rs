//! Order ingestion, lifecycle events and the manual transmission surfaces.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};
use transmit_core::{
    load_transmission_settings,
    transmit::{order_detail_actions, order_list_actions, OrderAction},
    AuditEvent, ManualSurface, Order, OrderError, OrderEvent, OrderId, OrderStatus,
    TransmissionResult, TransmitError, UpsertOrderRequest,
};

use super::middleware::AuthUser;
use crate::state::AppState;

/// Path of the list-view manual send, relative to the server root.
pub const AJAX_TRANSMIT_PATH: &str = "/api/v1/ajax/transmit_order_csv";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Order snapshot pushed by the commerce platform.
#[derive(Debug, Deserialize)]
pub struct UpsertOrderBody {
    pub number: String,
    pub status: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusBody {
    pub status: String,
}

/// Result of an order event.
#[derive(Debug, Serialize)]
pub struct OrderEventResponse {
    pub order: Order,
    /// Whether handlers were invoked
    pub dispatched: bool,
    pub results: Vec<TransmissionResult>,
}

#[derive(Debug, Serialize)]
pub struct OrderActionsResponse {
    /// Actions on the order detail view
    pub detail: Vec<OrderAction>,
    /// Row actions in the order list
    pub list: Vec<OrderAction>,
}

/// The list-view endpoint carries the id as an untyped query value.
#[derive(Debug, Deserialize)]
pub struct AjaxTransmitParams {
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<OrderErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(OrderErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn order_error(e: OrderError) -> ApiError {
    match e {
        OrderError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e),
        OrderError::Database(_) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

fn transmit_error(e: TransmitError) -> ApiError {
    match e {
        TransmitError::Order(e) => order_error(e),
        e => {
            error!(error = %e, "CSV transmission aborted");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

fn require_order(state: &AppState, id: OrderId) -> Result<Order, ApiError> {
    state
        .orders()
        .get(id)
        .map_err(order_error)?
        .ok_or_else(|| order_error(OrderError::NotFound(id)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create or replace an order snapshot. Does not fire status events.
pub async fn upsert_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(body): Json<UpsertOrderBody>,
) -> Result<Json<Order>, ApiError> {
    let request = UpsertOrderRequest {
        id: OrderId(id),
        number: body.number,
        status: OrderStatus::new(body.status),
        fields: body.fields,
    };
    let order = state.orders().upsert(request).map_err(order_error)?;
    Ok(Json(order))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Order>, ApiError> {
    require_order(&state, OrderId(id)).map(Json)
}

/// Move an order to a new status and dispatch the status event.
///
/// Re-posting the current status is recorded but dispatches nothing.
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(body): Json<SetStatusBody>,
) -> Result<Json<OrderEventResponse>, ApiError> {
    let id = OrderId(id);
    let previous = require_order(&state, id)?;
    let status = OrderStatus::new(body.status);

    let order = state
        .orders()
        .set_status(id, &status)
        .map_err(order_error)?;

    if previous.status == status {
        return Ok(Json(OrderEventResponse {
            order,
            dispatched: false,
            results: Vec::new(),
        }));
    }

    info!(order_id = %id, from = %previous.status, to = %status, "Order status changed");
    state
        .audit()
        .emit(AuditEvent::OrderStatusChanged {
            order_id: id.0,
            from_status: Some(previous.status.to_string()),
            to_status: status.to_string(),
        })
        .await;

    let results = state
        .registry()
        .dispatch(id, &OrderEvent::StatusChanged(status))
        .await
        .map_err(transmit_error)?;

    // Reload to pick up notes and flags written by the handlers.
    let order = require_order(&state, id)?;
    Ok(Json(OrderEventResponse {
        order,
        dispatched: true,
        results,
    }))
}

/// Signal that payment for the order was captured.
pub async fn payment_complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<OrderEventResponse>, ApiError> {
    let id = OrderId(id);
    require_order(&state, id)?;

    let results = state
        .registry()
        .dispatch(id, &OrderEvent::PaymentComplete)
        .await
        .map_err(transmit_error)?;

    let order = require_order(&state, id)?;
    Ok(Json(OrderEventResponse {
        order,
        dispatched: true,
        results,
    }))
}

/// Actions offered for an order in the detail view and the order list.
pub async fn order_actions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<OrderActionsResponse>, ApiError> {
    let order = require_order(&state, OrderId(id))?;
    let statuses = load_transmission_settings(state.settings())
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .trigger_statuses();

    Ok(Json(OrderActionsResponse {
        detail: order_detail_actions(),
        list: order_list_actions(&order, &statuses, AJAX_TRANSMIT_PATH),
    }))
}

/// Detail-view action: send now, then return the operator to the page.
pub async fn transmit_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    AuthUser(user_id): AuthUser,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    state
        .manual()
        .trigger(Some(OrderId(id)), &user_id, ManualSurface::OrderAction)
        .await
        .map_err(transmit_error)?;

    Ok(redirect_back(&state, &headers))
}

/// List-view action. A missing or malformed id sends nothing but still redirects.
pub async fn ajax_transmit(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AjaxTransmitParams>,
    AuthUser(user_id): AuthUser,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let order_id = params
        .order_id
        .as_deref()
        .and_then(|raw| raw.parse::<OrderId>().ok());

    state
        .manual()
        .trigger(order_id, &user_id, ManualSurface::Ajax)
        .await
        .map_err(transmit_error)?;

    Ok(redirect_back(&state, &headers))
}

fn redirect_back(state: &AppState, headers: &HeaderMap) -> Response {
    let target = safe_redirect_target(headers, &state.config().server.admin_url);
    Redirect::to(&target).into_response()
}

/// The Referer when it points back at this server, else `fallback`.
///
/// Accepts a path-absolute reference, or an absolute URL whose authority
/// matches the request's Host header.
pub fn safe_redirect_target(headers: &HeaderMap, fallback: &str) -> String {
    let Some(referer) = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
    else {
        return fallback.to_string();
    };

    if referer.starts_with('/') && !referer.starts_with("//") {
        return referer.to_string();
    }

    let authority = referer
        .strip_prefix("https://")
        .or_else(|| referer.strip_prefix("http://"))
        .map(|rest| rest.split(['/', '?', '#']).next().unwrap_or_default());
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());

    match (authority, host) {
        (Some(authority), Some(host))
            if !authority.is_empty() && authority.eq_ignore_ascii_case(host) =>
        {
            referer.to_string()
        }
        _ => fallback.to_string(),
    }
}
