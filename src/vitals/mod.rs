//! Vital sign domain logic
//!
//! - [`thresholds`]: which readings are abnormal and what alert they raise
//! - [`summary`]: latest-per-type views, blood pressure composite, chart bars

pub mod summary;
pub mod thresholds;

pub use summary::{chart_series, simulated_readings, BloodPressure, ChartBar, LatestVitals};
pub use thresholds::{assess, Assessment, VitalKind};

use serde::{Deserialize, Serialize};

/// A reading as submitted by a client: `{type, value, unit}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(rename = "type")]
    pub vital_type: String,
    pub value: f64,
    pub unit: String,
}

impl Reading {
    /// Reading of a known kind in its default unit
    pub fn new(kind: VitalKind, value: f64) -> Self {
        Self {
            unit: kind.default_unit().to_string(),
            vital_type: kind.as_str().to_string(),
            value,
        }
    }

    /// Reading with an explicit unit
    pub fn with_unit(vital_type: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            vital_type: vital_type.into(),
            value,
            unit: unit.into(),
        }
    }

    pub fn kind(&self) -> VitalKind {
        VitalKind::parse(&self.vital_type)
    }
}
