// libs/patient-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::extractor::require_patient;

use crate::models::{AccountError, LoginRequest, RegisterPatientRequest, UpdateProfileRequest};
use crate::services::AccountService;

fn map_account_error(e: AccountError) -> AppError {
    match e {
        AccountError::NotFound => AppError::NotFound("Patient not found".to_string()),
        AccountError::EmailTaken => {
            AppError::Conflict("User already exists with this email".to_string())
        }
        AccountError::PhoneTaken => {
            AppError::Conflict("User already exists with this phone number".to_string())
        }
        AccountError::InvalidCredentials => AppError::Auth("Invalid password".to_string()),
        AccountError::ValidationError(msg) => AppError::ValidationError(msg),
        AccountError::TokenError(msg) => AppError::Internal(msg),
        AccountError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn caller_id(user: &AuthUser) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Malformed subject in token".to_string()))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(&state);

    let registered = account_service
        .register(request)
        .await
        .map_err(map_account_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "User registered successfully",
        "token": registered.token,
        "user": {
            "id": registered.id,
            "first_name": registered.first_name,
            "last_name": registered.last_name,
            "email": registered.email,
            "phone": registered.phone
        }
    })))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(&state);

    let authenticated = account_service
        .login(request)
        .await
        .map_err(map_account_error)?;

    Ok(Json(json!({
        "success": true,
        "token": authenticated.token
    })))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;
    let patient_id = caller_id(&user)?;

    let account_service = AccountService::new(&state);

    let profile = account_service
        .get_profile(patient_id)
        .await
        .map_err(map_account_error)?;

    Ok(Json(json!({
        "success": true,
        "user": profile
    })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;
    let patient_id = caller_id(&user)?;

    let account_service = AccountService::new(&state);

    let profile = account_service
        .update_profile(patient_id, request)
        .await
        .map_err(map_account_error)?;

    Ok(Json(json!({
        "success": true,
        "user": profile,
        "message": "Profile updated successfully"
    })))
}
