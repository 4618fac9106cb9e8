//! Error types for authentication and authorization operations.

use eventreg_core::StoreError;
use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for identity, session and role operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// Unknown identifier or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password was correct but the account has not been confirmed yet.
    ///
    /// Callers route this to the confirmation step instead of failing.
    #[error("User {username} is not confirmed")]
    UserNotConfirmed {
        /// Generated username to confirm
        username: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Sign-up and Confirmation Errors
    // ═══════════════════════════════════════════════════════════

    /// Sign-up request failed validation.
    #[error("Invalid sign-up: {reason}")]
    InvalidSignUp {
        /// Which rule was violated
        reason: String,
    },

    /// Email or preferred username already belongs to an account.
    #[error("An account with this {field} already exists")]
    UserAlreadyExists {
        /// The conflicting field
        field: String,
    },

    /// No account with this username.
    #[error("User not found")]
    UserNotFound,

    /// Confirmation code does not match.
    #[error("Invalid confirmation code")]
    CodeMismatch,

    /// Confirmation code has expired; request a new one.
    #[error("Confirmation code has expired")]
    CodeExpired,

    /// Account is already confirmed.
    #[error("User is already confirmed")]
    AlreadyConfirmed,

    /// Confirmation code could not be delivered.
    #[error("Code delivery failed: {0}")]
    DeliveryFailed(String),

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════

    /// Session lacks the required role group.
    #[error("Access denied: {required} role required")]
    AccessDenied {
        /// Group name that was missing
        required: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Session Errors
    // ═══════════════════════════════════════════════════════════

    /// Session has expired.
    #[error("Session has expired")]
    SessionExpired,

    /// Session not found or revoked.
    #[error("Session not found")]
    SessionNotFound,

    // ═══════════════════════════════════════════════════════════
    // Infrastructure Errors
    // ═══════════════════════════════════════════════════════════

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// User storage failed.
    #[error("User store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Whether the error means the caller must confirm the account first.
    #[must_use]
    pub const fn requires_confirmation(&self) -> bool {
        matches!(self, Self::UserNotConfirmed { .. })
    }
}
