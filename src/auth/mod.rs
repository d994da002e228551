//! Account management
//!
//! Signup, login and demo-account seeding on top of the storage layer.
//!
//! - [`password`]: Argon2id hashing
//! - [`validation`]: form checks shared with the CLI

pub mod password;
pub mod validation;

pub use password::{hash_password, verify_password};
pub use validation::{
    validate_confirmation, validate_login, validate_signup, SignupForm, ValidSignup,
};

use crate::storage::{Database, NewUser, Role, StorageError, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Identity established by a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

/// Errors raised by signup and login
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Demo accounts created on an empty database
const DEMO_USERS: &[(&str, &str, Role)] = &[
    ("grandpa_joe", "Joe Smith", Role::Elderly),
    ("nurse_sarah", "Sarah Jones", Role::Caregiver),
];

const DEMO_PASSWORD: &str = "password123";

/// Signup and login against the user table
#[derive(Clone)]
pub struct AuthService {
    db: Arc<Database>,
}

impl AuthService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a new account
    pub fn signup(&self, form: &SignupForm) -> Result<User, AuthError> {
        let valid = validate_signup(form)?;

        if self.db.find_user(&valid.username)?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(&valid.password)?;
        let user = self
            .db
            .create_user(NewUser {
                username: valid.username,
                password_hash,
                role: valid.role,
                full_name: valid.full_name,
            })
            .map_err(|e| match e {
                // lost a race with a concurrent signup for the same name
                StorageError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Storage(other),
            })?;

        tracing::info!(username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    /// Verify credentials and return the session identity
    pub fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        validate_login(username, password)?;

        let user = self
            .db
            .find_user(username.trim())?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(username = %user.username, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Session::from(&user))
    }

    /// Create the demo accounts when no users exist. Returns how many were created.
    pub fn seed_demo_users(&self) -> Result<usize, AuthError> {
        if self.db.user_count()? > 0 {
            return Ok(0);
        }

        let password_hash = hash_password(DEMO_PASSWORD)?;
        for (username, full_name, role) in DEMO_USERS {
            self.db.create_user(NewUser {
                username: username.to_string(),
                password_hash: password_hash.clone(),
                role: *role,
                full_name: full_name.to_string(),
            })?;
        }

        tracing::info!(count = DEMO_USERS.len(), "Seeded demo users");
        Ok(DEMO_USERS.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn signup_form(username: &str, password: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            full_name: "Joe Smith".to_string(),
            password: password.to_string(),
            role: "elderly".to_string(),
        }
    }

    #[test]
    fn test_signup_then_login() {
        let auth = service();
        auth.signup(&signup_form("grandpa_joe", "password123")).unwrap();

        let session = auth.login("grandpa_joe", "password123").unwrap();
        assert_eq!(session.username, "grandpa_joe");
        assert_eq!(session.full_name, "Joe Smith");
        assert_eq!(session.role, Role::Elderly);
    }

    #[test]
    fn test_duplicate_signup() {
        let auth = service();
        auth.signup(&signup_form("grandpa_joe", "password123")).unwrap();

        let err = auth
            .signup(&signup_form("grandpa_joe", "different1"))
            .unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
        assert_eq!(err.to_string(), "Username already exists");
    }

    #[test]
    fn test_login_failures_look_the_same() {
        let auth = service();
        auth.signup(&signup_form("grandpa_joe", "password123")).unwrap();

        let wrong_password = auth.login("grandpa_joe", "nope").unwrap_err();
        let unknown_user = auth.login("nobody", "password123").unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_seed_only_on_empty_database() {
        let auth = service();
        assert_eq!(auth.seed_demo_users().unwrap(), 2);
        assert_eq!(auth.seed_demo_users().unwrap(), 0);

        let session = auth.login("nurse_sarah", DEMO_PASSWORD).unwrap();
        assert_eq!(session.role, Role::Caregiver);
    }
}
