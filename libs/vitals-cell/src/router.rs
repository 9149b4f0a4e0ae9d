// libs/vitals-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Blood-pressure tracking routes, mounted under `/api/user`.
pub fn vitals_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/bp-readings",
            post(handlers::add_bp_reading).get(handlers::get_bp_readings),
        )
        .route("/bp-analytics", get(handlers::get_bp_analytics))
        .route(
            "/bp-readings/{reading_id}",
            put(handlers::update_bp_reading).delete(handlers::delete_bp_reading),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
