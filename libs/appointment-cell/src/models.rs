// libs/appointment-cell/src/models.rs
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-doctor reservation ledger: calendar-date key ("15_08_2024") to the
/// time labels already booked on that date. The sole source of truth for
/// slot availability; appointment records are derived facts.
pub type SlotMap = HashMap<String, Vec<String>>;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub slot_date: String,
    pub slot_time: String,
    /// Doctor's fee captured at booking time.
    pub amount: f64,
    pub patient: PatientSnapshot,
    pub doctor: DoctorSnapshot,
    pub cancelled: bool,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Copy of the patient record taken at booking time. Immutable after
/// creation; never re-synced with the live patient record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
}

/// Copy of the doctor record taken at booking time, without credentials or
/// the reservation ledger. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSnapshot {
    pub id: Uuid,
    pub name: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub image: Option<String>,
    pub fees: f64,
    pub address: String,
}

// ==============================================================================
// STORE ROW VIEWS
// ==============================================================================

/// The subset of a doctor row the booking flow reads.
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorBookingView {
    pub id: Uuid,
    pub name: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub image: Option<String>,
    pub available: bool,
    pub fees: f64,
    pub address: String,
    #[serde(default)]
    pub slots_booked: SlotMap,
}

impl DoctorBookingView {
    pub fn to_snapshot(&self) -> DoctorSnapshot {
        DoctorSnapshot {
            id: self.id,
            name: self.name.clone(),
            speciality: self.speciality.clone(),
            degree: self.degree.clone(),
            experience: self.experience.clone(),
            image: self.image.clone(),
            fees: self.fees,
            address: self.address.clone(),
        }
    }
}

/// The subset of a patient row the booking flow reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientBookingView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
}

impl PatientBookingView {
    pub fn to_snapshot(&self) -> PatientSnapshot {
        PatientSnapshot {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            date_of_birth: self.date_of_birth,
            gender: self.gender.clone(),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub doctor_id: Uuid,
    pub slot_date: String,
    pub slot_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub appointment_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentActionRequest {
    pub appointment_id: Uuid,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not available")]
    DoctorNotAvailable,

    #[error("Slot already booked")]
    SlotTaken,

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
