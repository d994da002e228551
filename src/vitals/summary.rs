//! Dashboard summaries derived from recent readings
//!
//! - `LatestVitals`: newest reading per vital type
//! - `BloodPressure`: systolic/diastolic composite for the BP card
//! - `chart_series`: bars for the latest-readings chart
//! - `simulated_readings`: random plausible readings for demos

use crate::storage::Vital;
use crate::vitals::thresholds::VitalKind;
use crate::vitals::Reading;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;

/// Newest reading of each vital type
#[derive(Debug, Clone, Default)]
pub struct LatestVitals {
    by_type: HashMap<String, Vital>,
}

impl LatestVitals {
    /// Build from a newest-first list: the first reading seen per type wins
    pub fn from_recent(vitals: &[Vital]) -> Self {
        let mut by_type = HashMap::new();
        for vital in vitals {
            by_type
                .entry(vital.vital_type.clone())
                .or_insert_with(|| vital.clone());
        }
        Self { by_type }
    }

    pub fn get(&self, kind: &VitalKind) -> Option<&Vital> {
        self.by_type.get(kind.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Composite blood pressure, if either half has been recorded
    pub fn blood_pressure(&self) -> Option<BloodPressure> {
        let systolic = self.get(&VitalKind::BloodPressureSys);
        let diastolic = self.get(&VitalKind::BloodPressureDia);

        if systolic.is_none() && diastolic.is_none() {
            return None;
        }

        Some(BloodPressure {
            systolic: systolic.map(|v| v.value),
            diastolic: diastolic.map(|v| v.value),
            is_abnormal: systolic.map(|v| v.is_abnormal).unwrap_or(false)
                || diastolic.map(|v| v.is_abnormal).unwrap_or(false),
        })
    }
}

/// Blood pressure card value
#[derive(Debug, Clone, PartialEq)]
pub struct BloodPressure {
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub is_abnormal: bool,
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_else(|| "--".to_string());
        write!(f, "{}/{}", part(self.systolic), part(self.diastolic))
    }
}

/// One bar of the latest-readings chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
    pub is_abnormal: bool,
}

/// Bars for every known vital type that has a reading, in dashboard order
pub fn chart_series(latest: &LatestVitals) -> Vec<ChartBar> {
    VitalKind::known()
        .iter()
        .filter_map(|kind| {
            latest.get(kind).map(|v| ChartBar {
                label: kind.label().to_string(),
                value: v.value,
                is_abnormal: v.is_abnormal,
            })
        })
        .collect()
}

/// Random readings in the ranges a home monitor might produce
pub fn simulated_readings<R: Rng>(rng: &mut R) -> Vec<Reading> {
    let temperature = (rng.gen_range(97.0..101.0_f64) * 10.0).round() / 10.0;

    vec![
        Reading::new(VitalKind::HeartRate, rng.gen_range(60..110_u32) as f64),
        Reading::new(VitalKind::Spo2, rng.gen_range(90..100_u32) as f64),
        Reading::new(VitalKind::Glucose, rng.gen_range(80..160_u32) as f64),
        Reading::new(VitalKind::Temperature, temperature),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn vital(id: i64, kind: &str, value: f64, minutes_ago: i64, abnormal: bool) -> Vital {
        Vital {
            id,
            user_id: 1,
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            vital_type: kind.to_string(),
            value,
            unit: VitalKind::parse(kind).default_unit().to_string(),
            is_abnormal: abnormal,
        }
    }

    #[test]
    fn test_latest_keeps_first_of_each_type() {
        let recent = vec![
            vital(3, "heart_rate", 88.0, 1, false),
            vital(2, "spo2", 97.0, 2, false),
            vital(1, "heart_rate", 120.0, 3, true),
        ];
        let latest = LatestVitals::from_recent(&recent);

        assert_eq!(latest.get(&VitalKind::Spo2).unwrap().id, 2);
        assert_eq!(latest.get(&VitalKind::HeartRate).unwrap().value, 88.0);
        assert!(latest.get(&VitalKind::Glucose).is_none());
    }

    #[test]
    fn test_blood_pressure_composite() {
        let latest = LatestVitals::from_recent(&[
            vital(2, "blood_pressure_sys", 150.0, 1, true),
            vital(1, "blood_pressure_dia", 80.0, 1, false),
        ]);
        let bp = latest.blood_pressure().unwrap();
        assert_eq!(bp.systolic, Some(150.0));
        assert!(bp.is_abnormal);
        assert_eq!(bp.to_string(), "150/80");

        let only_dia = LatestVitals::from_recent(&[vital(1, "blood_pressure_dia", 70.0, 1, false)]);
        assert_eq!(only_dia.blood_pressure().unwrap().to_string(), "--/70");

        assert!(LatestVitals::default().blood_pressure().is_none());
    }

    #[test]
    fn test_chart_series_order() {
        let latest = LatestVitals::from_recent(&[
            vital(3, "temperature", 98.6, 1, false),
            vital(2, "heart_rate", 72.0, 1, false),
            vital(1, "weight", 80.0, 1, false),
        ]);
        let bars = chart_series(&latest);
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Heart Rate", "Temperature"]);
    }

    #[test]
    fn test_simulated_readings_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let readings = simulated_readings(&mut rng);
            assert_eq!(readings.len(), 4);
            for r in &readings {
                match VitalKind::parse(&r.vital_type) {
                    VitalKind::HeartRate => assert!((60.0..110.0).contains(&r.value)),
                    VitalKind::Spo2 => assert!((90.0..100.0).contains(&r.value)),
                    VitalKind::Glucose => assert!((80.0..160.0).contains(&r.value)),
                    VitalKind::Temperature => assert!((97.0..=101.0).contains(&r.value)),
                    other => panic!("unexpected kind {}", other),
                }
            }
        }
    }
}
