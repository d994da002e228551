//! Threshold checks for incoming vital readings
//!
//! Each known vital type has a normal band. A reading outside the band is
//! flagged abnormal and produces a human-readable alert message. Band edges
//! count as normal. Values in messages always keep a decimal point
//! (`120.0`, `100.2`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known vital types. Anything else is carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VitalKind {
    HeartRate,
    BloodPressureSys,
    BloodPressureDia,
    Spo2,
    Glucose,
    Temperature,
    Other(String),
}

impl VitalKind {
    /// All kinds that have thresholds, in dashboard order
    pub fn known() -> &'static [VitalKind] {
        &[
            VitalKind::HeartRate,
            VitalKind::BloodPressureSys,
            VitalKind::BloodPressureDia,
            VitalKind::Spo2,
            VitalKind::Glucose,
            VitalKind::Temperature,
        ]
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "heart_rate" => VitalKind::HeartRate,
            "blood_pressure_sys" => VitalKind::BloodPressureSys,
            "blood_pressure_dia" => VitalKind::BloodPressureDia,
            "spo2" => VitalKind::Spo2,
            "glucose" => VitalKind::Glucose,
            "temperature" => VitalKind::Temperature,
            other => VitalKind::Other(other.to_string()),
        }
    }

    /// Wire name, as stored in the `type` column
    pub fn as_str(&self) -> &str {
        match self {
            VitalKind::HeartRate => "heart_rate",
            VitalKind::BloodPressureSys => "blood_pressure_sys",
            VitalKind::BloodPressureDia => "blood_pressure_dia",
            VitalKind::Spo2 => "spo2",
            VitalKind::Glucose => "glucose",
            VitalKind::Temperature => "temperature",
            VitalKind::Other(name) => name,
        }
    }

    /// Short label for cards and charts
    pub fn label(&self) -> &str {
        match self {
            VitalKind::HeartRate => "Heart Rate",
            VitalKind::BloodPressureSys => "BP (Sys)",
            VitalKind::BloodPressureDia => "BP (Dia)",
            VitalKind::Spo2 => "SpO2",
            VitalKind::Glucose => "Glucose",
            VitalKind::Temperature => "Temperature",
            VitalKind::Other(name) => name,
        }
    }

    pub fn default_unit(&self) -> &'static str {
        match self {
            VitalKind::HeartRate => "bpm",
            VitalKind::BloodPressureSys | VitalKind::BloodPressureDia => "mmHg",
            VitalKind::Spo2 => "%",
            VitalKind::Glucose => "mg/dL",
            VitalKind::Temperature => "°F",
            VitalKind::Other(_) => "",
        }
    }
}

impl fmt::Display for VitalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for VitalKind {
    fn from(s: String) -> Self {
        VitalKind::parse(&s)
    }
}

impl From<VitalKind> for String {
    fn from(kind: VitalKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Outcome of checking one reading
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub abnormal: bool,
    /// Alert text, present only when abnormal
    pub message: Option<String>,
}

impl Assessment {
    fn normal() -> Self {
        Self {
            abnormal: false,
            message: None,
        }
    }

    fn abnormal(message: String) -> Self {
        Self {
            abnormal: true,
            message: Some(message),
        }
    }
}

/// Check a reading against the normal band for its kind
pub fn assess(kind: &VitalKind, value: f64) -> Assessment {
    let v = value;
    match kind {
        VitalKind::HeartRate if !(50.0..=100.0).contains(&v) => {
            Assessment::abnormal(format!("Abnormal HR detected ({:?} bpm)", v))
        }
        VitalKind::BloodPressureSys if !(90.0..=140.0).contains(&v) => {
            Assessment::abnormal(format!("Abnormal BP (Sys) detected ({:?} mmHg)", v))
        }
        VitalKind::BloodPressureDia if !(60.0..=90.0).contains(&v) => {
            Assessment::abnormal(format!("Abnormal BP (Dia) detected ({:?} mmHg)", v))
        }
        VitalKind::Spo2 if v < 95.0 => Assessment::abnormal(format!("Low SpO2 detected ({:?}%)", v)),
        VitalKind::Glucose if v > 140.0 => {
            Assessment::abnormal(format!("High Glucose detected ({:?} mg/dL)", v))
        }
        VitalKind::Temperature if v > 99.5 => {
            Assessment::abnormal(format!("High Temperature detected ({:?}°F)", v))
        }
        _ => Assessment::normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_rate_band() {
        assert!(!assess(&VitalKind::HeartRate, 50.0).abnormal);
        assert!(!assess(&VitalKind::HeartRate, 100.0).abnormal);
        assert!(assess(&VitalKind::HeartRate, 49.9).abnormal);

        let high = assess(&VitalKind::HeartRate, 120.0);
        assert!(high.abnormal);
        assert_eq!(high.message.as_deref(), Some("Abnormal HR detected (120.0 bpm)"));
    }

    #[test]
    fn test_blood_pressure_bands() {
        assert!(assess(&VitalKind::BloodPressureSys, 89.0).abnormal);
        assert!(!assess(&VitalKind::BloodPressureSys, 140.0).abnormal);
        assert!(assess(&VitalKind::BloodPressureSys, 141.0).abnormal);

        assert!(assess(&VitalKind::BloodPressureDia, 59.0).abnormal);
        assert!(!assess(&VitalKind::BloodPressureDia, 90.0).abnormal);
        assert_eq!(
            assess(&VitalKind::BloodPressureDia, 95.0).message.as_deref(),
            Some("Abnormal BP (Dia) detected (95.0 mmHg)")
        );
    }

    #[test]
    fn test_one_sided_thresholds() {
        assert!(!assess(&VitalKind::Spo2, 95.0).abnormal);
        assert_eq!(
            assess(&VitalKind::Spo2, 92.0).message.as_deref(),
            Some("Low SpO2 detected (92.0%)")
        );

        // glucose and temperature only alert on the high side
        assert!(!assess(&VitalKind::Glucose, 40.0).abnormal);
        assert!(assess(&VitalKind::Glucose, 140.5).abnormal);
        assert!(!assess(&VitalKind::Temperature, 99.5).abnormal);
        assert_eq!(
            assess(&VitalKind::Temperature, 100.2).message.as_deref(),
            Some("High Temperature detected (100.2°F)")
        );
    }

    #[test]
    fn test_unknown_kind_is_never_abnormal() {
        let kind = VitalKind::parse("weight");
        assert_eq!(kind, VitalKind::Other("weight".to_string()));
        assert!(!assess(&kind, 1_000.0).abnormal);
        assert_eq!(kind.default_unit(), "");
    }

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in VitalKind::known() {
            assert_eq!(&VitalKind::parse(kind.as_str()), kind);
        }
    }
}
