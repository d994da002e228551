//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{Alert, Severity, Vital};
use crate::vitals::Reading;

// ============================================
// AUTH DTOs
// ============================================

/// Login request
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Signup response
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    /// "User created successfully"
    pub message: String,
    pub username: String,
}

// ============================================
// CHAT DTOs
// ============================================

/// Chat request
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub username: String,
    pub message: String,
}

/// Chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

// ============================================
// INGEST DTOs
// ============================================

/// Single reading ingest request
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestRequest {
    pub username: String,
    #[serde(rename = "type")]
    pub vital_type: String,
    pub value: f64,
    pub unit: String,
}

impl IngestRequest {
    pub fn reading(&self) -> Reading {
        Reading::with_unit(self.vital_type.clone(), self.value, self.unit.clone())
    }
}

/// Single reading ingest response
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Status: "recorded"
    pub status: String,
    /// Whether the reading fell outside its normal band
    pub abnormal: bool,
}

/// Batch ingest request
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchIngestRequest {
    pub username: String,
    pub readings: Vec<Reading>,
}

/// Batch ingest response
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchIngestResponse {
    /// Status: "recorded"
    pub status: String,
    /// Number of readings stored
    pub recorded: usize,
    /// How many of them were abnormal
    pub abnormal: usize,
}

// ============================================
// DASHBOARD DTOs
// ============================================

/// Dashboard aggregate for one user
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    /// Full name of the user
    pub user: String,
    /// Recent readings, newest first
    pub vitals: Vec<VitalDto>,
    /// Recent alerts, newest first
    pub alerts: Vec<AlertDto>,
}

/// A reading as shown on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalDto {
    pub id: i64,
    #[serde(rename = "type")]
    pub vital_type: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub is_abnormal: bool,
}

impl From<Vital> for VitalDto {
    fn from(v: Vital) -> Self {
        Self {
            id: v.id,
            vital_type: v.vital_type,
            value: v.value,
            unit: v.unit,
            timestamp: v.timestamp,
            is_abnormal: v.is_abnormal,
        }
    }
}

impl From<VitalDto> for Vital {
    /// Dashboard rows carry no owner id
    fn from(v: VitalDto) -> Self {
        Self {
            id: v.id,
            user_id: 0,
            timestamp: v.timestamp,
            vital_type: v.vital_type,
            value: v.value,
            unit: v.unit,
            is_abnormal: v.is_abnormal,
        }
    }
}

/// An alert as shown on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDto {
    pub id: i64,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

impl From<Alert> for AlertDto {
    fn from(a: Alert) -> Self {
        Self {
            id: a.id,
            message: a.message,
            severity: a.severity,
            created_at: a.created_at,
            resolved: a.resolved,
        }
    }
}

/// Alert resolution request
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveAlertRequest {
    /// Owner of the alert
    pub username: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy"
    pub status: String,
    /// Database status: "ok" or "error"
    pub database: String,
    /// Chat backend: the model name, or "fallback"
    pub chat: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_alert_timestamp_has_utc_suffix() {
        let alert = AlertDto {
            id: 1,
            message: "Abnormal HR detected (120.0 bpm)".to_string(),
            severity: Severity::Medium,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            resolved: false,
        };

        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["created_at"], "2024-03-01T09:30:00Z");
        assert_eq!(json["severity"], "medium");
    }

    #[test]
    fn test_ingest_request_uses_type_key() {
        let req: IngestRequest = serde_json::from_str(
            r#"{"username": "grandpa_joe", "type": "heart_rate", "value": 72, "unit": "bpm"}"#,
        )
        .unwrap();
        assert_eq!(req.vital_type, "heart_rate");
        assert_eq!(req.reading().value, 72.0);
    }
}
