// libs/appointment-cell/src/services/booking.rs
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::StoreClient;
use shared_utils::validation::is_valid_slot_date;

use crate::models::{
    Appointment, BookSlotRequest, BookingError, DoctorBookingView, PatientBookingView, SlotMap,
};

pub struct BookingService {
    store: StoreClient,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
        }
    }

    /// Reserve a slot and create the appointment record.
    ///
    /// The reservation write happens before the appointment insert; a failed
    /// insert retracts the reservation so the slot is not leaked. The
    /// read-check-write on `slots_booked` itself is not guarded against
    /// interleaved requests.
    pub async fn book_slot(
        &self,
        patient_id: Uuid,
        request: BookSlotRequest,
    ) -> Result<Appointment, BookingError> {
        info!(
            "Booking slot {} {} with doctor {} for patient {}",
            request.slot_date, request.slot_time, request.doctor_id, patient_id
        );

        self.validate_slot_request(&request)?;

        let doctor = self.fetch_doctor(request.doctor_id).await?;
        if !doctor.available {
            return Err(BookingError::DoctorNotAvailable);
        }

        let mut slots = doctor.slots_booked.clone();
        let day = slots.entry(request.slot_date.clone()).or_default();
        if day.iter().any(|taken| taken == &request.slot_time) {
            debug!(
                "Slot {} {} already booked for doctor {}",
                request.slot_date, request.slot_time, doctor.id
            );
            return Err(BookingError::SlotTaken);
        }
        day.push(request.slot_time.clone());

        let patient = self.fetch_patient(patient_id).await?;

        // Reservation first; the appointment record is derived from it.
        self.write_slots(doctor.id, &slots).await?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            doctor_id: doctor.id,
            slot_date: request.slot_date.clone(),
            slot_time: request.slot_time.clone(),
            amount: doctor.fees,
            patient: patient.to_snapshot(),
            doctor: doctor.to_snapshot(),
            cancelled: false,
            completed: false,
            created_at: now,
            updated_at: now,
        };

        match self.insert_appointment(&appointment).await {
            Ok(stored) => {
                info!(
                    "Appointment {} booked with doctor {} at {} {}",
                    stored.id, stored.doctor_id, stored.slot_date, stored.slot_time
                );
                Ok(stored)
            }
            Err(e) => {
                // Retract the reservation so the slot is usable again.
                if let Some(day) = slots.get_mut(&request.slot_date) {
                    day.retain(|taken| taken != &request.slot_time);
                }
                if let Err(retract_err) = self.write_slots(doctor.id, &slots).await {
                    warn!(
                        "Failed to retract reservation {} {} for doctor {}: {}",
                        request.slot_date, request.slot_time, doctor.id, retract_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Cancel an appointment on behalf of its owning patient and release
    /// the reserved slot.
    pub async fn cancel_for_patient(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, BookingError> {
        debug!("Cancelling appointment {} for patient {}", appointment_id, patient_id);

        let appointment = self.fetch_appointment(appointment_id).await?;

        if appointment.patient_id != patient_id {
            return Err(BookingError::Unauthorized);
        }

        let cancelled = self
            .update_appointment(
                appointment_id,
                json!({ "cancelled": true, "updated_at": Utc::now().to_rfc3339() }),
            )
            .await?;

        self.release_slot(
            appointment.doctor_id,
            &appointment.slot_date,
            &appointment.slot_time,
        )
        .await?;

        info!("Appointment {} cancelled by patient {}", appointment_id, patient_id);
        Ok(cancelled)
    }

    /// Doctor-side completion. Flag update gated on ownership; the slot
    /// stays in the reservation ledger.
    pub async fn complete_for_doctor(
        &self,
        doctor_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, BookingError> {
        debug!("Completing appointment {} for doctor {}", appointment_id, doctor_id);

        let appointment = self.fetch_appointment(appointment_id).await?;

        if appointment.doctor_id != doctor_id {
            return Err(BookingError::Unauthorized);
        }

        self.update_appointment(
            appointment_id,
            json!({ "completed": true, "updated_at": Utc::now().to_rfc3339() }),
        )
        .await
    }

    /// Doctor-side cancellation. Flag update gated on ownership; no
    /// slot-map interaction.
    pub async fn cancel_for_doctor(
        &self,
        doctor_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, BookingError> {
        debug!("Doctor {} cancelling appointment {}", doctor_id, appointment_id);

        let appointment = self.fetch_appointment(appointment_id).await?;

        if appointment.doctor_id != doctor_id {
            return Err(BookingError::Unauthorized);
        }

        self.update_appointment(
            appointment_id,
            json!({ "cancelled": true, "updated_at": Utc::now().to_rfc3339() }),
        )
        .await
    }

    /// A patient's appointments, newest first.
    pub async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, BookingError> {
        self.list_appointments(&format!("patient_id=eq.{}&order=created_at.desc", patient_id))
            .await
    }

    /// A doctor's appointments, newest first.
    pub async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, BookingError> {
        self.list_appointments(&format!("doctor_id=eq.{}&order=created_at.desc", doctor_id))
            .await
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        self.fetch_appointment(appointment_id).await
    }

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    fn validate_slot_request(&self, request: &BookSlotRequest) -> Result<(), BookingError> {
        if request.slot_time.trim().is_empty() {
            return Err(BookingError::ValidationError(
                "Slot time must not be empty".to_string(),
            ));
        }
        if !is_valid_slot_date(&request.slot_date) {
            return Err(BookingError::ValidationError(
                "Slot date must use the DD_MM_YYYY key format".to_string(),
            ));
        }
        Ok(())
    }

    async fn fetch_doctor(&self, doctor_id: Uuid) -> Result<DoctorBookingView, BookingError> {
        let result = self
            .store
            .select("doctors", &format!("id=eq.{}", doctor_id))
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(BookingError::DoctorNotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse doctor: {}", e)))
    }

    async fn fetch_patient(&self, patient_id: Uuid) -> Result<PatientBookingView, BookingError> {
        let result = self
            .store
            .select("patients", &format!("id=eq.{}", patient_id))
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(BookingError::PatientNotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse patient: {}", e)))
    }

    async fn fetch_appointment(&self, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        let result = self
            .store
            .select("appointments", &format!("id=eq.{}", appointment_id))
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(BookingError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    async fn list_appointments(&self, filter: &str) -> Result<Vec<Appointment>, BookingError> {
        let result = self
            .store
            .select("appointments", filter)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    async fn write_slots(&self, doctor_id: Uuid, slots: &SlotMap) -> Result<(), BookingError> {
        let patch = json!({
            "slots_booked": slots,
            "updated_at": Utc::now().to_rfc3339()
        });

        let result = self
            .store
            .update("doctors", &format!("id=eq.{}", doctor_id), patch)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::DatabaseError(
                "Failed to update doctor slots".to_string(),
            ));
        }

        Ok(())
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<Appointment, BookingError> {
        let row: Value = serde_json::to_value(appointment)
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let result = self
            .store
            .insert("appointments", row)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let Some(stored) = result.into_iter().next() else {
            return Err(BookingError::DatabaseError(
                "Failed to create appointment".to_string(),
            ));
        };

        serde_json::from_value(stored).map_err(|e| {
            BookingError::DatabaseError(format!("Failed to parse created appointment: {}", e))
        })
    }

    async fn update_appointment(
        &self,
        appointment_id: Uuid,
        patch: Value,
    ) -> Result<Appointment, BookingError> {
        let result = self
            .store
            .update("appointments", &format!("id=eq.{}", appointment_id), patch)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let Some(stored) = result.into_iter().next() else {
            return Err(BookingError::NotFound);
        };

        serde_json::from_value(stored).map_err(|e| {
            BookingError::DatabaseError(format!("Failed to parse updated appointment: {}", e))
        })
    }

    /// Remove one reserved time label from a doctor's ledger. Filtering
    /// keeps this a no-op when the entry is already absent.
    async fn release_slot(
        &self,
        doctor_id: Uuid,
        slot_date: &str,
        slot_time: &str,
    ) -> Result<(), BookingError> {
        let doctor = self.fetch_doctor(doctor_id).await?;

        let mut slots = doctor.slots_booked;
        if let Some(day) = slots.get_mut(slot_date) {
            day.retain(|taken| taken != slot_time);
        }

        self.write_slots(doctor_id, &slots).await
    }
}
