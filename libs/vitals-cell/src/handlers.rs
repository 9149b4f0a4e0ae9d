// libs/vitals-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::extractor::require_patient;

use crate::models::{AddBpReadingRequest, ReadingsWindowQuery, UpdateBpReadingRequest, VitalsError};
use crate::services::ReadingsService;

fn map_vitals_error(e: VitalsError) -> AppError {
    match e {
        VitalsError::NotFound => AppError::NotFound("Reading not found".to_string()),
        VitalsError::Unauthorized => AppError::Auth("Not authorized for this reading".to_string()),
        VitalsError::ValidationError(msg) => AppError::ValidationError(msg),
        VitalsError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn caller_id(user: &AuthUser) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Malformed subject in token".to_string()))
}

#[axum::debug_handler]
pub async fn add_bp_reading(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<AddBpReadingRequest>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;
    let patient_id = caller_id(&user)?;

    let readings_service = ReadingsService::new(&state);

    let reading = readings_service
        .add_reading(patient_id, request)
        .await
        .map_err(map_vitals_error)?;

    Ok(Json(json!({
        "success": true,
        "reading": reading,
        "message": "Reading recorded successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_bp_readings(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ReadingsWindowQuery>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;
    let patient_id = caller_id(&user)?;

    let readings_service = ReadingsService::new(&state);

    let readings = readings_service
        .list_readings(patient_id, query.days)
        .await
        .map_err(map_vitals_error)?;

    Ok(Json(json!({
        "success": true,
        "readings": readings
    })))
}

#[axum::debug_handler]
pub async fn get_bp_analytics(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ReadingsWindowQuery>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;
    let patient_id = caller_id(&user)?;

    let readings_service = ReadingsService::new(&state);

    let analytics = readings_service
        .analytics(patient_id, query.days)
        .await
        .map_err(map_vitals_error)?;

    Ok(Json(json!({
        "success": true,
        "analytics": analytics
    })))
}

#[axum::debug_handler]
pub async fn update_bp_reading(
    State(state): State<Arc<AppConfig>>,
    Path(reading_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateBpReadingRequest>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;
    let patient_id = caller_id(&user)?;

    let readings_service = ReadingsService::new(&state);

    let reading = readings_service
        .update_reading(patient_id, reading_id, request)
        .await
        .map_err(map_vitals_error)?;

    Ok(Json(json!({
        "success": true,
        "reading": reading,
        "message": "Reading updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_bp_reading(
    State(state): State<Arc<AppConfig>>,
    Path(reading_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;
    let patient_id = caller_id(&user)?;

    let readings_service = ReadingsService::new(&state);

    readings_service
        .delete_reading(patient_id, reading_id)
        .await
        .map_err(map_vitals_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Reading deleted successfully"
    })))
}
