//! Utility functions for authentication.

use crate::error::{AuthError, Result};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::{Rng, RngCore};

/// Validate email address format.
///
/// This performs basic RFC 5322 validation:
/// - Must contain exactly one `@`
/// - Must have non-empty local and domain parts
/// - Length must be between 3 and 255 characters
///
/// # Examples
///
/// ```
/// use eventreg_auth::utils::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(!is_valid_email("invalid"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("user@"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain must contain at least one dot
    if !domain.contains('.') {
        return false;
    }

    let valid_local_chars = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain_chars = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    local.chars().all(valid_local_chars)
        && domain.chars().all(valid_domain_chars)
        && domain.split('.').all(|part| !part.is_empty())
}

/// Validate a phone number in international format: `+` followed by 8 to 15 digits.
///
/// # Examples
///
/// ```
/// use eventreg_auth::utils::is_valid_phone_number;
///
/// assert!(is_valid_phone_number("+15551234567"));
/// assert!(!is_valid_phone_number("5551234567"));
/// ```
#[must_use]
pub fn is_valid_phone_number(phone: &str) -> bool {
    phone.strip_prefix('+').is_some_and(|digits| {
        (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
    })
}

/// Generate a six-digit numeric confirmation code.
#[must_use]
pub fn generate_confirmation_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Hash a password with Argon2id and a fresh random salt.
///
/// The result is a PHC string (`$argon2id$v=19$...`) carrying its own
/// parameters and salt.
///
/// # Errors
///
/// Returns [`AuthError::PasswordHash`] if the hasher rejects its input.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Check a password against a PHC string produced by [`hash_password`].
///
/// Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, encoded: &str) -> bool {
    PasswordHash::new(encoded).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
