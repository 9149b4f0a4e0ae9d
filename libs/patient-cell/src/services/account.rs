// libs/patient-cell/src/services/account.rs
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::StoreClient;
use shared_utils::jwt::sign_token;
use shared_utils::password::{hash_password, verify_password};
use shared_utils::validation::{
    is_strong_password, is_valid_blood_group, is_valid_email, is_valid_gender, is_valid_phone,
    MIN_PASSWORD_LENGTH,
};

use crate::models::{
    AccountError, AuthenticatedPatient, LoginRequest, Patient, PatientProfile,
    RegisterPatientRequest, UpdateProfileRequest,
};

pub struct AccountService {
    store: StoreClient,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    pub async fn register(
        &self,
        request: RegisterPatientRequest,
    ) -> Result<AuthenticatedPatient, AccountError> {
        debug!("Registering patient: {}", request.email);

        self.validate_registration(&request)?;

        // Duplicate email or phone rejects the whole registration.
        let existing = self
            .store
            .select(
                "patients",
                &format!("or=(email.eq.{},phone.eq.{})", request.email, request.phone),
            )
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if let Some(row) = existing.first() {
            if row["email"].as_str() == Some(request.email.as_str()) {
                return Err(AccountError::EmailTaken);
            }
            return Err(AccountError::PhoneTaken);
        }

        let password_hash = hash_password(&request.password)
            .map_err(AccountError::ValidationError)?;

        let now = Utc::now();
        let patient_id = Uuid::new_v4();

        let row = json!({
            "id": patient_id,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "email": request.email,
            "phone": request.phone,
            "password_hash": password_hash,
            "date_of_birth": request.date_of_birth,
            "gender": request.gender,
            "blood_group": request.blood_group,
            "height": request.height,
            "weight": request.weight,
            "address": request.address,
            "city": request.city,
            "state": request.state,
            "zip_code": request.zip_code,
            "country": request.country,
            "medical_conditions": request.medical_conditions,
            "allergies": request.allergies,
            "medications": request.medications,
            "emergency_contact_name": request.emergency_contact_name,
            "emergency_contact_number": request.emergency_contact_number,
            "health_notifications": request.health_notifications.unwrap_or(true),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result = self
            .store
            .insert("patients", row)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let Some(stored) = result.into_iter().next() else {
            return Err(AccountError::DatabaseError(
                "Failed to create patient".to_string(),
            ));
        };

        let patient: Patient = serde_json::from_value(stored)
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse patient: {}", e)))?;

        let token = self.issue_token(&patient)?;

        info!("Patient {} registered", patient.id);
        Ok(AuthenticatedPatient {
            token,
            id: patient.id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            email: patient.email,
            phone: patient.phone,
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthenticatedPatient, AccountError> {
        debug!("Patient login: {}", request.email);

        if request.email.is_empty() || request.password.is_empty() {
            return Err(AccountError::ValidationError(
                "Please enter email and password".to_string(),
            ));
        }

        let patient = self.fetch_by_email(&request.email).await?;

        if !verify_password(&request.password, &patient.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.issue_token(&patient)?;

        info!("Patient {} logged in", patient.id);
        Ok(AuthenticatedPatient {
            token,
            id: patient.id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            email: patient.email,
            phone: patient.phone,
        })
    }

    pub async fn get_profile(&self, patient_id: Uuid) -> Result<PatientProfile, AccountError> {
        let patient = self.fetch_by_id(patient_id).await?;
        Ok(patient.into())
    }

    pub async fn update_profile(
        &self,
        patient_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<PatientProfile, AccountError> {
        debug!("Updating profile for patient: {}", patient_id);

        if let Some(ref phone) = request.phone {
            if !is_valid_phone(phone) {
                return Err(AccountError::ValidationError(
                    "Please enter a valid phone number".to_string(),
                ));
            }
        }
        if let Some(ref gender) = request.gender {
            if !is_valid_gender(gender) {
                return Err(AccountError::ValidationError(
                    "Please select a valid gender".to_string(),
                ));
            }
        }
        if let Some(ref blood_group) = request.blood_group {
            if !is_valid_blood_group(blood_group) {
                return Err(AccountError::ValidationError(
                    "Please select a valid blood group".to_string(),
                ));
            }
        }

        let mut update_data = serde_json::Map::new();

        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(date_of_birth) = request.date_of_birth {
            update_data.insert("date_of_birth".to_string(), json!(date_of_birth));
        }
        if let Some(gender) = request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(blood_group) = request.blood_group {
            update_data.insert("blood_group".to_string(), json!(blood_group));
        }
        if let Some(height) = request.height {
            update_data.insert("height".to_string(), json!(height));
        }
        if let Some(weight) = request.weight {
            update_data.insert("weight".to_string(), json!(weight));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(city) = request.city {
            update_data.insert("city".to_string(), json!(city));
        }
        if let Some(state) = request.state {
            update_data.insert("state".to_string(), json!(state));
        }
        if let Some(zip_code) = request.zip_code {
            update_data.insert("zip_code".to_string(), json!(zip_code));
        }
        if let Some(country) = request.country {
            update_data.insert("country".to_string(), json!(country));
        }
        if let Some(medical_conditions) = request.medical_conditions {
            update_data.insert("medical_conditions".to_string(), json!(medical_conditions));
        }
        if let Some(allergies) = request.allergies {
            update_data.insert("allergies".to_string(), json!(allergies));
        }
        if let Some(medications) = request.medications {
            update_data.insert("medications".to_string(), json!(medications));
        }
        if let Some(emergency_contact_name) = request.emergency_contact_name {
            update_data.insert(
                "emergency_contact_name".to_string(),
                json!(emergency_contact_name),
            );
        }
        if let Some(emergency_contact_number) = request.emergency_contact_number {
            update_data.insert(
                "emergency_contact_number".to_string(),
                json!(emergency_contact_number),
            );
        }
        if let Some(health_notifications) = request.health_notifications {
            update_data.insert("health_notifications".to_string(), json!(health_notifications));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let result = self
            .store
            .update(
                "patients",
                &format!("id=eq.{}", patient_id),
                Value::Object(update_data),
            )
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let Some(stored) = result.into_iter().next() else {
            return Err(AccountError::NotFound);
        };

        let patient: Patient = serde_json::from_value(stored)
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse patient: {}", e)))?;

        Ok(patient.into())
    }

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    fn validate_registration(&self, request: &RegisterPatientRequest) -> Result<(), AccountError> {
        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(AccountError::ValidationError(
                "Missing required fields".to_string(),
            ));
        }
        if !is_valid_email(&request.email) {
            return Err(AccountError::ValidationError(
                "Please enter a valid email".to_string(),
            ));
        }
        if !is_strong_password(&request.password) {
            return Err(AccountError::ValidationError(format!(
                "Please enter a strong password (minimum {} characters)",
                MIN_PASSWORD_LENGTH
            )));
        }
        if !is_valid_phone(&request.phone) {
            return Err(AccountError::ValidationError(
                "Please enter a valid phone number".to_string(),
            ));
        }
        if !is_valid_gender(&request.gender) {
            return Err(AccountError::ValidationError(
                "Please select a valid gender".to_string(),
            ));
        }
        if let Some(ref blood_group) = request.blood_group {
            if !is_valid_blood_group(blood_group) {
                return Err(AccountError::ValidationError(
                    "Please select a valid blood group".to_string(),
                ));
            }
        }
        if [
            &request.address,
            &request.city,
            &request.state,
            &request.zip_code,
            &request.country,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
        {
            return Err(AccountError::ValidationError(
                "Please fill all required personal information".to_string(),
            ));
        }
        if !request.agree_terms || !request.agree_privacy {
            return Err(AccountError::ValidationError(
                "Please agree to terms and privacy policy".to_string(),
            ));
        }
        Ok(())
    }

    fn issue_token(&self, patient: &Patient) -> Result<String, AccountError> {
        sign_token(
            &patient.id.to_string(),
            Some(&patient.email),
            "patient",
            &self.jwt_secret,
        )
        .map_err(AccountError::TokenError)
    }

    async fn fetch_by_email(&self, email: &str) -> Result<Patient, AccountError> {
        let result = self
            .store
            .select("patients", &format!("email=eq.{}", email))
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(AccountError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse patient: {}", e)))
    }

    async fn fetch_by_id(&self, patient_id: Uuid) -> Result<Patient, AccountError> {
        let result = self
            .store
            .select("patients", &format!("id=eq.{}", patient_id))
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(AccountError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse patient: {}", e)))
    }
}
