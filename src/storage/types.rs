//! Core record types persisted by the companion database
//!
//! - `User`: an elderly person or a caregiver with login credentials
//! - `Vital`: a single physiological measurement
//! - `Alert`: a notification raised for an abnormal vital
//! - `Role` and `Severity`: classification enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Who a user account belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person whose vitals are tracked
    #[default]
    Elderly,
    /// Someone looking after an elderly user
    Caregiver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Elderly => "elderly",
            Role::Caregiver => "caregiver",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "elderly" => Ok(Role::Elderly),
            "caregiver" => Ok(Role::Caregiver),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Alert urgency
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

/// A registered account
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to address the user by: full name when set, otherwise the username
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

/// Fields needed to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub full_name: String,
}

/// A stored vital sign reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vital {
    pub id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub vital_type: String,
    pub value: f64,
    pub unit: String,
    pub is_abnormal: bool,
}

/// A reading waiting to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewVital {
    pub vital_type: String,
    pub value: f64,
    pub unit: String,
    pub is_abnormal: bool,
    pub timestamp: DateTime<Utc>,
}

impl NewVital {
    /// Create a reading stamped with the current time
    pub fn new(vital_type: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            vital_type: vital_type.into(),
            value,
            unit: unit.into(),
            is_abnormal: false,
            timestamp: Utc::now(),
        }
    }

    /// Builder method: set the abnormal flag
    pub fn abnormal(mut self, is_abnormal: bool) -> Self {
        self.is_abnormal = is_abnormal;
        self
    }

    /// Builder method: set the timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A stored alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub resolved: bool,
}

/// An alert waiting to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub severity: Severity,
    pub message: String,
}

impl NewAlert {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("elderly".parse::<Role>().unwrap(), Role::Elderly);
        assert_eq!(" Caregiver ".parse::<Role>().unwrap(), Role::Caregiver);
        assert!("doctor".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Elderly);
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut user = User {
            id: 1,
            username: "grandpa_joe".to_string(),
            password_hash: String::new(),
            role: Role::Elderly,
            full_name: "Joe Smith".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "Joe Smith");

        user.full_name = "  ".to_string();
        assert_eq!(user.display_name(), "grandpa_joe");
    }

    #[test]
    fn test_vital_serializes_type_field() {
        let vital = Vital {
            id: 1,
            user_id: 1,
            timestamp: Utc::now(),
            vital_type: "heart_rate".to_string(),
            value: 72.0,
            unit: "bpm".to_string(),
            is_abnormal: false,
        };
        let json = serde_json::to_value(&vital).unwrap();
        assert_eq!(json["type"], "heart_rate");
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            username: "nurse_sarah".to_string(),
            password_hash: "secret".to_string(),
            role: Role::Caregiver,
            full_name: "Sarah Jones".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "caregiver");
    }
}
