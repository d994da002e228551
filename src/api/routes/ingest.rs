//! Ingest Routes
//!
//! Endpoints for recording vital sign readings.
//!
//! - POST /api/v1/ingest - Single reading
//! - POST /api/v1/ingest/batch - Several readings, stored all-or-nothing
//!
//! Every reading is checked against its normal band; an abnormal one is
//! stored together with a medium-severity alert.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{BatchIngestRequest, BatchIngestResponse, IngestRequest, IngestResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::JsonBody;
use crate::api::state::AppState;
use crate::storage::{NewAlert, NewVital, Severity, User};
use crate::vitals::{assess, Reading};

/// Longest accepted `type` or `unit`
pub const MAX_FIELD_LEN: usize = 50;

/// Largest accepted batch
pub const MAX_BATCH_SIZE: usize = 100;

/// POST /api/v1/ingest
///
/// Record a single reading.
pub async fn ingest_single(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<IngestRequest>,
) -> ApiResult<Json<IngestResponse>> {
    let reading = req.reading();
    validate_reading(&reading)?;

    let user = find_user(&state, &req.username)?;
    let (vital, alert) = prepare(&reading);
    let abnormal = vital.is_abnormal;

    let stored = state.db.record_vital(user.id, vital, alert)?;

    tracing::info!(
        username = %user.username,
        vital_type = %stored.vital_type,
        value = stored.value,
        abnormal,
        "Vital recorded"
    );

    Ok(Json(IngestResponse {
        status: "recorded".to_string(),
        abnormal,
    }))
}

/// POST /api/v1/ingest/batch
///
/// Record several readings in one transaction. Any invalid reading rejects
/// the whole batch.
pub async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<BatchIngestRequest>,
) -> ApiResult<Json<BatchIngestResponse>> {
    // Validate batch size
    if req.readings.is_empty() {
        return Err(ApiError::Validation("No readings provided".to_string()));
    }

    if req.readings.len() > MAX_BATCH_SIZE {
        return Err(ApiError::Validation(format!(
            "Batch size exceeds maximum of {} readings",
            MAX_BATCH_SIZE
        )));
    }

    for (index, reading) in req.readings.iter().enumerate() {
        validate_reading(reading)
            .map_err(|e| ApiError::Validation(format!("Reading {}: {}", index + 1, e)))?;
    }

    let user = find_user(&state, &req.username)?;

    let prepared: Vec<_> = req.readings.iter().map(prepare).collect();
    let abnormal = prepared.iter().filter(|(v, _)| v.is_abnormal).count();

    let stored = state.db.record_vitals(user.id, prepared)?;

    tracing::info!(
        username = %user.username,
        recorded = stored.len(),
        abnormal,
        "Vital batch recorded"
    );

    Ok(Json(BatchIngestResponse {
        status: "recorded".to_string(),
        recorded: stored.len(),
        abnormal,
    }))
}

/// Assess a reading and build the rows to store
fn prepare(reading: &Reading) -> (NewVital, Option<NewAlert>) {
    let assessment = assess(&reading.kind(), reading.value);

    let vital = NewVital::new(reading.vital_type.trim(), reading.value, reading.unit.trim())
        .abnormal(assessment.abnormal);
    let alert = assessment
        .message
        .map(|message| NewAlert::new(Severity::Medium, message));

    (vital, alert)
}

fn find_user(state: &AppState, username: &str) -> ApiResult<User> {
    state
        .db
        .find_user(username.trim())?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Validate one reading
fn validate_reading(reading: &Reading) -> ApiResult<()> {
    if reading.vital_type.trim().is_empty() {
        return Err(ApiError::Validation("Vital type cannot be empty".to_string()));
    }

    if reading.vital_type.len() > MAX_FIELD_LEN {
        return Err(ApiError::Validation(format!(
            "Vital type exceeds maximum length of {} characters",
            MAX_FIELD_LEN
        )));
    }

    if reading.unit.trim().is_empty() {
        return Err(ApiError::Validation("Unit cannot be empty".to_string()));
    }

    if reading.unit.len() > MAX_FIELD_LEN {
        return Err(ApiError::Validation(format!(
            "Unit exceeds maximum length of {} characters",
            MAX_FIELD_LEN
        )));
    }

    if !reading.value.is_finite() {
        return Err(ApiError::Validation("Value must be a finite number".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitals::VitalKind;

    #[test]
    fn test_validate_reading() {
        assert!(validate_reading(&Reading::new(VitalKind::HeartRate, 72.0)).is_ok());
        assert!(validate_reading(&Reading::with_unit(" ", 72.0, "bpm")).is_err());
        assert!(validate_reading(&Reading::with_unit("heart_rate", 72.0, "")).is_err());
        assert!(validate_reading(&Reading::with_unit("heart_rate", f64::NAN, "bpm")).is_err());
        assert!(validate_reading(&Reading::with_unit("x".repeat(51), 1.0, "u")).is_err());
    }

    #[test]
    fn test_prepare_abnormal_reading_raises_alert() {
        let (vital, alert) = prepare(&Reading::new(VitalKind::HeartRate, 120.0));
        assert!(vital.is_abnormal);

        let alert = alert.unwrap();
        assert_eq!(alert.severity, Severity::Medium);
        assert_eq!(alert.message, "Abnormal HR detected (120.0 bpm)");
    }

    #[test]
    fn test_prepare_normal_reading() {
        let (vital, alert) = prepare(&Reading::new(VitalKind::Spo2, 97.0));
        assert!(!vital.is_abnormal);
        assert!(alert.is_none());
    }
}
