//! Password hashing and password-rule checks
//!
//! Hashes are Argon2id PHC strings with a random salt per hash.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Shortest password accepted on register or credential change
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hash a password with Argon2id.
///
/// ```ignore
/// let hash = hash_password("Admin@123")?;
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// A wrong password is `Ok(false)`; only a malformed hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e))
            .context("Password verification error"),
    }
}

/// Check a password/confirmation pair, returning the message to show
pub fn check_new_password(password: &str, confirm_password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Some("Password must be at least 6 characters.");
    }
    if password != confirm_password {
        return Some("Passwords do not match.");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id_and_salted() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        assert!(hash1.starts_with("$argon2id$"));
        assert_ne!(hash1, hash2);
        assert!(!hash1.contains("same_password"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("Admin@123").unwrap();
        assert!(verify_password("Admin@123", &hash).unwrap());
        assert!(!verify_password("admin@123", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash_format").is_err());
    }

    #[test]
    fn test_unicode_password_round_trips() {
        let hash = hash_password("كلمة-سر🔐").unwrap();
        assert!(verify_password("كلمة-سر🔐", &hash).unwrap());
    }

    #[test]
    fn test_check_new_password() {
        assert_eq!(check_new_password("12345", "12345"), Some("Password must be at least 6 characters."));
        assert_eq!(check_new_password("123456", "123457"), Some("Passwords do not match."));
        assert_eq!(check_new_password("123456", "123456"), None);
        // length counts characters, not bytes
        assert!(check_new_password("سر٢٣٤", "سر٢٣٤").is_some());
    }
}
