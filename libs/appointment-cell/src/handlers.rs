// libs/appointment-cell/src/handlers.rs
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
use shared_utils::extractor::{require_doctor, require_patient};

use crate::models::{AppointmentActionRequest, BookSlotRequest, BookingError, CancelAppointmentRequest};
use crate::services::BookingService;

fn caller_id(user: &AuthUser) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Malformed subject in token".to_string()))
}

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        BookingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        BookingError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        BookingError::DoctorNotAvailable => {
            AppError::BadRequest("Doctor not available".to_string())
        }
        BookingError::SlotTaken => AppError::Conflict("Slot already booked".to_string()),
        BookingError::Unauthorized => {
            AppError::Auth("Not authorized for this appointment".to_string())
        }
        BookingError::ValidationError(msg) => AppError::ValidationError(msg),
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// PATIENT-SIDE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;
    let patient_id = caller_id(&user)?;

    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .book_slot(patient_id, request)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;
    let patient_id = caller_id(&user)?;

    let booking_service = BookingService::new(&state);

    booking_service
        .cancel_for_patient(patient_id, request.appointment_id)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;
    let patient_id = caller_id(&user)?;

    let booking_service = BookingService::new(&state);

    let appointments = booking_service
        .appointments_for_patient(patient_id)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

// ==============================================================================
// DOCTOR-SIDE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;
    let doctor_id = caller_id(&user)?;

    let booking_service = BookingService::new(&state);

    let appointments = booking_service
        .appointments_for_doctor(doctor_id)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<AppointmentActionRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;
    let doctor_id = caller_id(&user)?;

    let booking_service = BookingService::new(&state);

    booking_service
        .complete_for_doctor(doctor_id, request.appointment_id)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment marked completed"
    })))
}

#[axum::debug_handler]
pub async fn doctor_cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<AppointmentActionRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;
    let doctor_id = caller_id(&user)?;

    let booking_service = BookingService::new(&state);

    booking_service
        .cancel_for_doctor(doctor_id, request.appointment_id)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled"
    })))
}
