// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Patient-facing appointment routes, mounted under `/api/user`.
pub fn patient_appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/book-appointment", post(handlers::book_appointment))
        .route("/appointments", get(handlers::list_appointments))
        .route("/cancel-appointment", post(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Doctor-facing appointment routes, mounted under `/api/doctor`.
pub fn doctor_appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/appointments", get(handlers::doctor_appointments))
        .route("/complete-appointment", post(handlers::complete_appointment))
        .route("/cancel-appointment", post(handlers::doctor_cancel_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
