//! Identity provider configuration.
//!
//! Values are provided by the application, not hardcoded.

use chrono::Duration;

/// Settings for [`LocalIdentityProvider`](crate::providers::LocalIdentityProvider).
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// How long a session stays valid after sign-in.
    ///
    /// Default: 1 hour
    pub session_ttl: Duration,

    /// How long a confirmation code stays valid.
    ///
    /// Default: 24 hours
    pub confirmation_code_ttl: Duration,

    /// Minimum accepted password length.
    ///
    /// Default: 8
    pub min_password_length: usize,
}

impl IdentityConfig {
    /// Set session duration.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set confirmation code lifetime.
    #[must_use]
    pub const fn with_confirmation_code_ttl(mut self, ttl: Duration) -> Self {
        self.confirmation_code_ttl = ttl;
        self
    }

    /// Set minimum password length.
    #[must_use]
    pub const fn with_min_password_length(mut self, length: usize) -> Self {
        self.min_password_length = length;
        self
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(1),
            confirmation_code_ttl: Duration::hours(24),
            min_password_length: 8,
        }
    }
}
