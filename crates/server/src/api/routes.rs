use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{audit, handlers, middleware as mw, notices, orders, settings};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Authenticated API routes
    let api_routes = Router::new()
        // Config
        .route("/config", get(handlers::get_config))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Orders
        .route(
            "/orders/{id}",
            get(orders::get_order).put(orders::upsert_order),
        )
        .route("/orders/{id}/status", post(orders::set_status))
        .route("/orders/{id}/payment-complete", post(orders::payment_complete))
        .route("/orders/{id}/actions", get(orders::order_actions))
        .route(
            "/orders/{id}/actions/transmit_order_csv",
            post(orders::transmit_action),
        )
        .route("/ajax/transmit_order_csv", get(orders::ajax_transmit))
        // Notices
        .route("/notices", get(notices::drain_notices))
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            mw::auth_middleware,
        ));

    // Unauthenticated probes
    let public_routes = Router::new().route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api_routes.merge(public_routes))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(mw::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
