//! Password hashing and verification with Argon2id
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...`) in the
//! `password_hash` column.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::auth::AuthError;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
///
/// `Ok(false)` on mismatch, `Err` only when the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }
}
