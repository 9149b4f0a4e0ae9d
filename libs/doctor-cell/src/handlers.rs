// libs/doctor-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{
    AddDoctorRequest, AdminLoginRequest, ChangeAvailabilityRequest, DoctorLoginRequest,
    DirectoryError,
};
use crate::services::DirectoryService;

fn map_directory_error(e: DirectoryError) -> AppError {
    match e {
        DirectoryError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DirectoryError::EmailTaken => {
            AppError::Conflict("Doctor already exists with this email".to_string())
        }
        DirectoryError::InvalidCredentials => AppError::Auth("Invalid credentials".to_string()),
        DirectoryError::ValidationError(msg) => AppError::ValidationError(msg),
        DirectoryError::TokenError(msg) => AppError::Internal(msg),
        DirectoryError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let directory_service = DirectoryService::new(&state);

    let doctors = directory_service
        .list_doctors()
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "doctors": doctors
    })))
}

#[axum::debug_handler]
pub async fn doctor_login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<DoctorLoginRequest>,
) -> Result<Json<Value>, AppError> {
    let directory_service = DirectoryService::new(&state);

    let token = directory_service
        .login(request)
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "token": token
    })))
}

#[axum::debug_handler]
pub async fn admin_login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<Value>, AppError> {
    let directory_service = DirectoryService::new(&state);

    let token = directory_service
        .admin_login(request)
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "token": token
    })))
}

#[axum::debug_handler]
pub async fn add_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<AddDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let directory_service = DirectoryService::new(&state);

    let doctor = directory_service
        .add_doctor(request)
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Doctor added successfully"
    })))
}

#[axum::debug_handler]
pub async fn change_availability(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ChangeAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let directory_service = DirectoryService::new(&state);

    let available = directory_service
        .change_availability(request)
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "available": available,
        "message": "Doctor availability changed successfully"
    })))
}
