// libs/vitals-cell/src/services/readings.rs
use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::StoreClient;

use crate::models::{
    AddBpReadingRequest, BpAnalytics, BpCategory, BpReading, BpTrend, UpdateBpReadingRequest,
    VitalsError,
};

const SYSTOLIC_RANGE: std::ops::RangeInclusive<i32> = 50..=300;
const DIASTOLIC_RANGE: std::ops::RangeInclusive<i32> = 30..=200;
const PULSE_RANGE: std::ops::RangeInclusive<i32> = 20..=250;

const DEFAULT_WINDOW_DAYS: i64 = 30;

pub struct ReadingsService {
    store: StoreClient,
}

impl ReadingsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
        }
    }

    pub async fn add_reading(
        &self,
        patient_id: Uuid,
        request: AddBpReadingRequest,
    ) -> Result<BpReading, VitalsError> {
        validate_measurements(request.systolic, request.diastolic, request.pulse)?;

        let now = Utc::now();
        let recorded_at = request.recorded_at.unwrap_or(now);
        let category = BpCategory::classify(request.systolic, request.diastolic);

        let row = json!({
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "systolic": request.systolic,
            "diastolic": request.diastolic,
            "pulse": request.pulse,
            "recorded_at": recorded_at.to_rfc3339(),
            "notes": request.notes,
            "category": category.to_string(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result = self
            .store
            .insert("bp_readings", row)
            .await
            .map_err(|e| VitalsError::DatabaseError(e.to_string()))?;

        let Some(stored) = result.into_iter().next() else {
            return Err(VitalsError::DatabaseError(
                "Failed to create reading".to_string(),
            ));
        };

        let reading: BpReading = serde_json::from_value(stored)
            .map_err(|e| VitalsError::DatabaseError(format!("Failed to parse reading: {}", e)))?;

        info!("BP reading {} recorded for patient {}", reading.id, patient_id);
        Ok(reading)
    }

    /// A patient's readings, newest first, optionally limited to a window
    /// of trailing days.
    pub async fn list_readings(
        &self,
        patient_id: Uuid,
        days: Option<i64>,
    ) -> Result<Vec<BpReading>, VitalsError> {
        let mut filter = format!("patient_id=eq.{}&order=recorded_at.desc", patient_id);

        if let Some(days) = days {
            if days <= 0 {
                return Err(VitalsError::ValidationError(
                    "Window must be a positive number of days".to_string(),
                ));
            }
            let cutoff = Utc::now() - Duration::days(days);
            filter.push_str(&format!("&recorded_at=gte.{}", cutoff.to_rfc3339()));
        }

        let result = self
            .store
            .select("bp_readings", &filter)
            .await
            .map_err(|e| VitalsError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<BpReading>, _>>()
            .map_err(|e| VitalsError::DatabaseError(format!("Failed to parse readings: {}", e)))
    }

    pub async fn analytics(
        &self,
        patient_id: Uuid,
        days: Option<i64>,
    ) -> Result<BpAnalytics, VitalsError> {
        let window = days.unwrap_or(DEFAULT_WINDOW_DAYS);
        let readings = self.list_readings(patient_id, Some(window)).await?;

        debug!(
            "Computing BP analytics over {} readings for patient {}",
            readings.len(),
            patient_id
        );

        Ok(compute_analytics(&readings))
    }

    pub async fn update_reading(
        &self,
        patient_id: Uuid,
        reading_id: Uuid,
        request: UpdateBpReadingRequest,
    ) -> Result<BpReading, VitalsError> {
        let current = self.fetch_reading(reading_id).await?;

        if current.patient_id != patient_id {
            return Err(VitalsError::Unauthorized);
        }

        let systolic = request.systolic.unwrap_or(current.systolic);
        let diastolic = request.diastolic.unwrap_or(current.diastolic);
        let pulse = request.pulse.unwrap_or(current.pulse);
        validate_measurements(systolic, diastolic, pulse)?;

        let mut update_data = serde_json::Map::new();
        update_data.insert("systolic".to_string(), json!(systolic));
        update_data.insert("diastolic".to_string(), json!(diastolic));
        update_data.insert("pulse".to_string(), json!(pulse));
        update_data.insert(
            "category".to_string(),
            json!(BpCategory::classify(systolic, diastolic).to_string()),
        );
        if let Some(recorded_at) = request.recorded_at {
            update_data.insert("recorded_at".to_string(), json!(recorded_at.to_rfc3339()));
        }
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let result = self
            .store
            .update(
                "bp_readings",
                &format!("id=eq.{}", reading_id),
                Value::Object(update_data),
            )
            .await
            .map_err(|e| VitalsError::DatabaseError(e.to_string()))?;

        let Some(stored) = result.into_iter().next() else {
            return Err(VitalsError::NotFound);
        };

        serde_json::from_value(stored)
            .map_err(|e| VitalsError::DatabaseError(format!("Failed to parse reading: {}", e)))
    }

    pub async fn delete_reading(
        &self,
        patient_id: Uuid,
        reading_id: Uuid,
    ) -> Result<(), VitalsError> {
        let current = self.fetch_reading(reading_id).await?;

        if current.patient_id != patient_id {
            return Err(VitalsError::Unauthorized);
        }

        self.store
            .delete("bp_readings", &format!("id=eq.{}", reading_id))
            .await
            .map_err(|e| VitalsError::DatabaseError(e.to_string()))?;

        info!("BP reading {} deleted for patient {}", reading_id, patient_id);
        Ok(())
    }

    async fn fetch_reading(&self, reading_id: Uuid) -> Result<BpReading, VitalsError> {
        let result = self
            .store
            .select("bp_readings", &format!("id=eq.{}", reading_id))
            .await
            .map_err(|e| VitalsError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(VitalsError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| VitalsError::DatabaseError(format!("Failed to parse reading: {}", e)))
    }
}

fn validate_measurements(systolic: i32, diastolic: i32, pulse: i32) -> Result<(), VitalsError> {
    if !SYSTOLIC_RANGE.contains(&systolic) {
        return Err(VitalsError::ValidationError(
            "Systolic value out of range".to_string(),
        ));
    }
    if !DIASTOLIC_RANGE.contains(&diastolic) {
        return Err(VitalsError::ValidationError(
            "Diastolic value out of range".to_string(),
        ));
    }
    if !PULSE_RANGE.contains(&pulse) {
        return Err(VitalsError::ValidationError(
            "Pulse value out of range".to_string(),
        ));
    }
    Ok(())
}

/// Aggregate a window of readings. Input is newest-first, as listed.
pub fn compute_analytics(readings: &[BpReading]) -> BpAnalytics {
    if readings.is_empty() {
        return BpAnalytics {
            reading_count: 0,
            avg_systolic: 0.0,
            avg_diastolic: 0.0,
            avg_pulse: 0.0,
            min_systolic: 0,
            max_systolic: 0,
            min_diastolic: 0,
            max_diastolic: 0,
            category_breakdown: Vec::new(),
            trend: BpTrend::InsufficientData,
        };
    }

    let count = readings.len();
    let sum_systolic: i64 = readings.iter().map(|r| r.systolic as i64).sum();
    let sum_diastolic: i64 = readings.iter().map(|r| r.diastolic as i64).sum();
    let sum_pulse: i64 = readings.iter().map(|r| r.pulse as i64).sum();

    let mut category_counts: HashMap<BpCategory, usize> = HashMap::new();
    for reading in readings {
        *category_counts.entry(reading.category).or_insert(0) += 1;
    }
    let mut category_breakdown: Vec<(BpCategory, usize)> = category_counts.into_iter().collect();
    category_breakdown.sort_by(|a, b| b.1.cmp(&a.1));

    BpAnalytics {
        reading_count: count,
        avg_systolic: sum_systolic as f64 / count as f64,
        avg_diastolic: sum_diastolic as f64 / count as f64,
        avg_pulse: sum_pulse as f64 / count as f64,
        min_systolic: readings.iter().map(|r| r.systolic).min().unwrap_or(0),
        max_systolic: readings.iter().map(|r| r.systolic).max().unwrap_or(0),
        min_diastolic: readings.iter().map(|r| r.diastolic).min().unwrap_or(0),
        max_diastolic: readings.iter().map(|r| r.diastolic).max().unwrap_or(0),
        category_breakdown,
        trend: compute_trend(readings),
    }
}

/// Newest-first input: the second half of the slice is the older half.
fn compute_trend(readings: &[BpReading]) -> BpTrend {
    const STABLE_BAND_MMHG: f64 = 3.0;

    if readings.len() < 4 {
        return BpTrend::InsufficientData;
    }

    let mid = readings.len() / 2;
    let newer = &readings[..mid];
    let older = &readings[mid..];

    let newer_avg: f64 =
        newer.iter().map(|r| r.systolic as f64).sum::<f64>() / newer.len() as f64;
    let older_avg: f64 =
        older.iter().map(|r| r.systolic as f64).sum::<f64>() / older.len() as f64;

    let delta = newer_avg - older_avg;
    if delta > STABLE_BAND_MMHG {
        BpTrend::Rising
    } else if delta < -STABLE_BAND_MMHG {
        BpTrend::Falling
    } else {
        BpTrend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(systolic: i32, diastolic: i32) -> BpReading {
        let now = Utc::now();
        BpReading {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            systolic,
            diastolic,
            pulse: 70,
            recorded_at: now,
            notes: None,
            category: BpCategory::classify(systolic, diastolic),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn classification_bands() {
        assert_eq!(BpCategory::classify(110, 70), BpCategory::Normal);
        assert_eq!(BpCategory::classify(124, 75), BpCategory::Elevated);
        assert_eq!(BpCategory::classify(132, 78), BpCategory::HypertensionStage1);
        assert_eq!(BpCategory::classify(118, 84), BpCategory::HypertensionStage1);
        assert_eq!(BpCategory::classify(145, 85), BpCategory::HypertensionStage2);
        assert_eq!(BpCategory::classify(120, 95), BpCategory::HypertensionStage2);
        assert_eq!(BpCategory::classify(185, 100), BpCategory::HypertensiveCrisis);
        assert_eq!(BpCategory::classify(110, 125), BpCategory::HypertensiveCrisis);
        assert_eq!(BpCategory::classify(85, 55), BpCategory::Low);
    }

    #[test]
    fn measurement_ranges() {
        assert!(validate_measurements(120, 80, 70).is_ok());
        assert!(validate_measurements(20, 80, 70).is_err());
        assert!(validate_measurements(120, 250, 70).is_err());
        assert!(validate_measurements(120, 80, 10).is_err());
    }

    #[test]
    fn analytics_over_empty_window() {
        let analytics = compute_analytics(&[]);
        assert_eq!(analytics.reading_count, 0);
        assert_eq!(analytics.trend, BpTrend::InsufficientData);
    }

    #[test]
    fn analytics_aggregates() {
        let readings = vec![reading(120, 80), reading(130, 85), reading(110, 70)];
        let analytics = compute_analytics(&readings);

        assert_eq!(analytics.reading_count, 3);
        assert!((analytics.avg_systolic - 120.0).abs() < f64::EPSILON);
        assert_eq!(analytics.min_systolic, 110);
        assert_eq!(analytics.max_systolic, 130);
        assert_eq!(analytics.min_diastolic, 70);
        assert_eq!(analytics.max_diastolic, 85);
        // Too few readings to call a trend.
        assert_eq!(analytics.trend, BpTrend::InsufficientData);
    }

    #[test]
    fn rising_trend_detected() {
        // Newest first: recent readings higher than older ones.
        let readings = vec![
            reading(150, 90),
            reading(148, 88),
            reading(120, 80),
            reading(118, 78),
        ];
        assert_eq!(compute_analytics(&readings).trend, BpTrend::Rising);
    }

    #[test]
    fn stable_trend_within_band() {
        let readings = vec![
            reading(121, 80),
            reading(120, 80),
            reading(119, 80),
            reading(120, 80),
        ];
        assert_eq!(compute_analytics(&readings).trend, BpTrend::Stable);
    }
}
