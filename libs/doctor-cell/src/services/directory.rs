// libs/doctor-cell/src/services/directory.rs
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::StoreClient;
use shared_utils::jwt::sign_token;
use shared_utils::password::{hash_password, verify_password};
use shared_utils::validation::{is_strong_password, is_valid_email, MIN_PASSWORD_LENGTH};

use crate::models::{
    AddDoctorRequest, AdminLoginRequest, ChangeAvailabilityRequest, Doctor, DoctorLoginRequest,
    DoctorPublic, DirectoryError,
};

pub struct DirectoryService {
    store: StoreClient,
    jwt_secret: String,
    admin_email: String,
    admin_password: String,
}

impl DirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
            jwt_secret: config.jwt_secret.clone(),
            admin_email: config.admin_email.clone(),
            admin_password: config.admin_password.clone(),
        }
    }

    /// The public directory: every doctor, credentials stripped.
    pub async fn list_doctors(&self) -> Result<Vec<DoctorPublic>, DirectoryError> {
        let result = self
            .store
            .select("doctors", "order=name.asc")
            .await
            .map_err(|e| DirectoryError::DatabaseError(e.to_string()))?;

        let doctors = result
            .into_iter()
            .map(serde_json::from_value::<Doctor>)
            .collect::<Result<Vec<Doctor>, _>>()
            .map_err(|e| DirectoryError::DatabaseError(format!("Failed to parse doctors: {}", e)))?;

        Ok(doctors.into_iter().map(DoctorPublic::from).collect())
    }

    pub async fn login(&self, request: DoctorLoginRequest) -> Result<String, DirectoryError> {
        debug!("Doctor login: {}", request.email);

        let doctor = self.fetch_by_email(&request.email).await?;

        if !verify_password(&request.password, &doctor.password_hash) {
            return Err(DirectoryError::InvalidCredentials);
        }

        let token = sign_token(
            &doctor.id.to_string(),
            Some(&doctor.email),
            "doctor",
            &self.jwt_secret,
        )
        .map_err(DirectoryError::TokenError)?;

        info!("Doctor {} logged in", doctor.id);
        Ok(token)
    }

    /// Admin credentials live in configuration, not the store.
    pub fn admin_login(&self, request: AdminLoginRequest) -> Result<String, DirectoryError> {
        if self.admin_email.is_empty()
            || request.email != self.admin_email
            || request.password != self.admin_password
        {
            return Err(DirectoryError::InvalidCredentials);
        }

        let token = sign_token(&request.email, Some(&request.email), "admin", &self.jwt_secret)
            .map_err(DirectoryError::TokenError)?;

        info!("Admin logged in");
        Ok(token)
    }

    pub async fn add_doctor(&self, request: AddDoctorRequest) -> Result<DoctorPublic, DirectoryError> {
        debug!("Adding doctor: {}", request.email);

        self.validate_new_doctor(&request)?;

        let existing = self
            .store
            .select("doctors", &format!("email=eq.{}", request.email))
            .await
            .map_err(|e| DirectoryError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(DirectoryError::EmailTaken);
        }

        let password_hash = hash_password(&request.password)
            .map_err(DirectoryError::ValidationError)?;

        let now = Utc::now();
        let row = json!({
            "id": Uuid::new_v4(),
            "name": request.name,
            "email": request.email,
            "password_hash": password_hash,
            "image": request.image,
            "speciality": request.speciality,
            "degree": request.degree,
            "experience": request.experience,
            "about": request.about,
            "available": request.available,
            "fees": request.fees,
            "address": request.address,
            "slots_booked": {},
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result = self
            .store
            .insert("doctors", row)
            .await
            .map_err(|e| DirectoryError::DatabaseError(e.to_string()))?;

        let Some(stored) = result.into_iter().next() else {
            return Err(DirectoryError::DatabaseError(
                "Failed to create doctor".to_string(),
            ));
        };

        let doctor: Doctor = serde_json::from_value(stored)
            .map_err(|e| DirectoryError::DatabaseError(format!("Failed to parse doctor: {}", e)))?;

        info!("Doctor {} added to directory", doctor.id);
        Ok(doctor.into())
    }

    /// Flip a doctor's availability flag.
    pub async fn change_availability(
        &self,
        request: ChangeAvailabilityRequest,
    ) -> Result<bool, DirectoryError> {
        let doctor = self.fetch_by_id(request.doctor_id).await?;

        let toggled = !doctor.available;
        let patch = json!({
            "available": toggled,
            "updated_at": Utc::now().to_rfc3339()
        });

        let result = self
            .store
            .update("doctors", &format!("id=eq.{}", doctor.id), patch)
            .await
            .map_err(|e| DirectoryError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(DirectoryError::NotFound);
        }

        info!("Doctor {} availability set to {}", doctor.id, toggled);
        Ok(toggled)
    }

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    fn validate_new_doctor(&self, request: &AddDoctorRequest) -> Result<(), DirectoryError> {
        if [
            &request.name,
            &request.speciality,
            &request.degree,
            &request.experience,
            &request.about,
            &request.address,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
        {
            return Err(DirectoryError::ValidationError(
                "Missing required fields".to_string(),
            ));
        }
        if !is_valid_email(&request.email) {
            return Err(DirectoryError::ValidationError(
                "Please enter a valid email".to_string(),
            ));
        }
        if !is_strong_password(&request.password) {
            return Err(DirectoryError::ValidationError(format!(
                "Please enter a strong password (minimum {} characters)",
                MIN_PASSWORD_LENGTH
            )));
        }
        if request.fees <= 0.0 {
            return Err(DirectoryError::ValidationError(
                "Fees must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    async fn fetch_by_email(&self, email: &str) -> Result<Doctor, DirectoryError> {
        let result = self
            .store
            .select("doctors", &format!("email=eq.{}", email))
            .await
            .map_err(|e| DirectoryError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(DirectoryError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| DirectoryError::DatabaseError(format!("Failed to parse doctor: {}", e)))
    }

    async fn fetch_by_id(&self, doctor_id: Uuid) -> Result<Doctor, DirectoryError> {
        let result = self
            .store
            .select("doctors", &format!("id=eq.{}", doctor_id))
            .await
            .map_err(|e| DirectoryError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(DirectoryError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| DirectoryError::DatabaseError(format!("Failed to parse doctor: {}", e)))
    }
}
