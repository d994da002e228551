//! Form validation shared by the server and the CLI
//!
//! The messages here are shown to users verbatim.

use crate::auth::AuthError;
use crate::storage::Role;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 50;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_FULL_NAME_LEN: usize = 100;

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid username pattern"))
}

/// Signup form as submitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub full_name: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    Role::Elderly.as_str().to_string()
}

/// A signup form that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSignup {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub role: Role,
}

/// Validate a signup form; usernames and names are trimmed, passwords are not
pub fn validate_signup(form: &SignupForm) -> Result<ValidSignup, AuthError> {
    let username = form.username.trim();
    let full_name = form.full_name.trim();

    if username.is_empty() || full_name.is_empty() || form.password.is_empty() {
        return Err(AuthError::Validation("Please fill in all fields".to_string()));
    }

    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AuthError::Validation(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::Validation(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }

    if !username_pattern().is_match(username) {
        return Err(AuthError::Validation(
            "Username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }

    if full_name.chars().count() > MAX_FULL_NAME_LEN {
        return Err(AuthError::Validation(format!(
            "Full name must be at most {} characters",
            MAX_FULL_NAME_LEN
        )));
    }

    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let role = form
        .role
        .parse::<Role>()
        .map_err(|_| AuthError::Validation("Role must be 'elderly' or 'caregiver'".to_string()))?;

    Ok(ValidSignup {
        username: username.to_string(),
        full_name: full_name.to_string(),
        password: form.password.clone(),
        role,
    })
}

/// The confirm-password field must match
pub fn validate_confirmation(password: &str, confirm: &str) -> Result<(), AuthError> {
    if confirm.is_empty() {
        return Err(AuthError::Validation("Please fill in all fields".to_string()));
    }
    if password != confirm {
        return Err(AuthError::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}

/// Both login fields must be present
pub fn validate_login(username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "Please enter both username and password".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, full_name: &str, password: &str, role: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            full_name: full_name.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        }
    }

    fn message(err: AuthError) -> String {
        err.to_string()
    }

    #[test]
    fn test_valid_signup_is_trimmed() {
        let valid = validate_signup(&form("  grandpa_joe ", " Joe Smith ", "password123", "elderly"))
            .unwrap();
        assert_eq!(valid.username, "grandpa_joe");
        assert_eq!(valid.full_name, "Joe Smith");
        assert_eq!(valid.role, Role::Elderly);
    }

    #[test]
    fn test_missing_fields() {
        let err = validate_signup(&form("joe", "   ", "password123", "elderly")).unwrap_err();
        assert_eq!(message(err), "Please fill in all fields");
    }

    #[test]
    fn test_username_too_short() {
        let err = validate_signup(&form("jo", "Joe", "password123", "elderly")).unwrap_err();
        assert_eq!(message(err), "Username must be at least 3 characters");
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_signup(&form("joe smith", "Joe", "password123", "elderly")).is_err());
        assert!(validate_signup(&form("joe.smith-1", "Joe", "password123", "elderly")).is_ok());
    }

    #[test]
    fn test_password_too_short() {
        let err = validate_signup(&form("grandpa_joe", "Joe", "12345", "elderly")).unwrap_err();
        assert_eq!(message(err), "Password must be at least 6 characters");
    }

    #[test]
    fn test_unknown_role() {
        assert!(validate_signup(&form("grandpa_joe", "Joe", "password123", "doctor")).is_err());
    }

    #[test]
    fn test_role_defaults_to_elderly() {
        let parsed: SignupForm = serde_json::from_str(
            r#"{"username": "joe", "full_name": "Joe", "password": "secret1"}"#,
        )
        .unwrap();
        assert_eq!(validate_signup(&parsed).unwrap().role, Role::Elderly);
    }

    #[test]
    fn test_confirmation() {
        assert!(validate_confirmation("secret1", "secret1").is_ok());
        assert_eq!(
            message(validate_confirmation("secret1", "secret2").unwrap_err()),
            "Passwords do not match"
        );
    }

    #[test]
    fn test_empty_login() {
        assert_eq!(
            message(validate_login("", "x").unwrap_err()),
            "Please enter both username and password"
        );
        assert!(validate_login("joe", "").is_err());
        assert!(validate_login("joe", "x").is_ok());
    }
}
