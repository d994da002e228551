//! Recent-health context handed to the model and the fallback responder

use crate::storage::Vital;
use crate::vitals::VitalKind;

/// What the agent knows about a user's recent readings
#[derive(Debug, Clone, PartialEq)]
pub enum VitalContext {
    /// No account with that username
    UserNotFound,
    /// Account exists but has no readings
    Empty,
    /// Newest-first readings
    Readings(Vec<Vital>),
}

impl VitalContext {
    pub fn from_recent(vitals: Vec<Vital>) -> Self {
        if vitals.is_empty() {
            VitalContext::Empty
        } else {
            VitalContext::Readings(vitals)
        }
    }

    pub fn readings(&self) -> &[Vital] {
        match self {
            VitalContext::Readings(v) => v,
            _ => &[],
        }
    }

    pub fn has_readings(&self) -> bool {
        !self.readings().is_empty()
    }

    pub fn has_abnormal(&self) -> bool {
        self.readings().iter().any(|v| v.is_abnormal)
    }

    pub fn has_normal(&self) -> bool {
        self.readings().iter().any(|v| !v.is_abnormal)
    }

    /// Newest value of a kind as `"{value} {unit}"`
    pub fn latest_value(&self, kind: &VitalKind) -> Option<String> {
        self.readings()
            .iter()
            .find(|v| v.vital_type == kind.as_str())
            .map(|v| format!("{:?} {}", v.value, v.unit))
    }

    /// Plain-text report, one line per reading
    pub fn report(&self) -> String {
        match self {
            VitalContext::UserNotFound => "User not found.".to_string(),
            VitalContext::Empty => "No recent vitals found.".to_string(),
            VitalContext::Readings(vitals) => vitals
                .iter()
                .map(|v| {
                    let status = if v.is_abnormal {
                        "⚠️ Abnormal"
                    } else {
                        "✅ Normal"
                    };
                    format!(
                        "- {}: {} = {:?} {} ({})",
                        v.timestamp.format("%Y-%m-%d %H:%M"),
                        v.vital_type,
                        v.value,
                        v.unit,
                        status
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
