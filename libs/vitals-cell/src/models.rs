// libs/vitals-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BpReading {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: i32,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub category: BpCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Standard AHA blood-pressure bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BpCategory {
    Low,
    Normal,
    Elevated,
    HypertensionStage1,
    HypertensionStage2,
    HypertensiveCrisis,
}

impl BpCategory {
    pub fn classify(systolic: i32, diastolic: i32) -> Self {
        if systolic > 180 || diastolic > 120 {
            BpCategory::HypertensiveCrisis
        } else if systolic >= 140 || diastolic >= 90 {
            BpCategory::HypertensionStage2
        } else if systolic >= 130 || diastolic >= 80 {
            BpCategory::HypertensionStage1
        } else if systolic >= 120 {
            BpCategory::Elevated
        } else if systolic < 90 || diastolic < 60 {
            BpCategory::Low
        } else {
            BpCategory::Normal
        }
    }
}

impl fmt::Display for BpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BpCategory::Low => write!(f, "low"),
            BpCategory::Normal => write!(f, "normal"),
            BpCategory::Elevated => write!(f, "elevated"),
            BpCategory::HypertensionStage1 => write!(f, "hypertension_stage1"),
            BpCategory::HypertensionStage2 => write!(f, "hypertension_stage2"),
            BpCategory::HypertensiveCrisis => write!(f, "hypertensive_crisis"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AddBpReadingRequest {
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: i32,
    pub recorded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBpReadingRequest {
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub pulse: Option<i32>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadingsWindowQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BpAnalytics {
    pub reading_count: usize,
    pub avg_systolic: f64,
    pub avg_diastolic: f64,
    pub avg_pulse: f64,
    pub min_systolic: i32,
    pub max_systolic: i32,
    pub min_diastolic: i32,
    pub max_diastolic: i32,
    pub category_breakdown: Vec<(BpCategory, usize)>,
    pub trend: BpTrend,
}

/// Older-half vs newer-half systolic average comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BpTrend {
    Rising,
    Falling,
    Stable,
    InsufficientData,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum VitalsError {
    #[error("Reading not found")]
    NotFound,

    #[error("Unauthorized access to reading")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
