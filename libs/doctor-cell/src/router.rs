// libs/doctor-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Public directory and doctor login, mounted under `/api/doctor`.
pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/login", post(handlers::doctor_login))
        .with_state(state)
}

/// Admin doctor management, mounted under `/api/admin`.
pub fn admin_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new().route("/login", post(handlers::admin_login));

    let protected_routes = Router::new()
        .route("/add-doctor", post(handlers::add_doctor))
        .route("/change-availability", post(handlers::change_availability))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
