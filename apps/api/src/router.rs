use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{doctor_appointment_routes, patient_appointment_routes};
use doctor_cell::router::{admin_routes, doctor_routes};
use patient_cell::router::account_routes;
use shared_config::AppConfig;
use vitals_cell::router::vitals_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let user_routes = account_routes(state.clone())
        .merge(patient_appointment_routes(state.clone()))
        .merge(vitals_routes(state.clone()));

    let doctor_side = doctor_routes(state.clone()).merge(doctor_appointment_routes(state.clone()));

    Router::new()
        .route("/", get(|| async { "CareBook API is running!" }))
        .nest("/api/user", user_routes)
        .nest("/api/doctor", doctor_side)
        .nest("/api/admin", admin_routes(state))
}
