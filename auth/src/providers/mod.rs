//! Identity provider and code delivery abstractions.
//!
//! These traits abstract over the external identity service so the portals
//! and HTTP layer can be tested without one.

pub mod console_delivery;
pub mod local;

pub use console_delivery::ConsoleCodeDelivery;
pub use local::LocalIdentityProvider;

use crate::error::Result;
use crate::session::{Role, Session, SessionId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by the dyn-compatible auth traits.
pub type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// New account details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpRequest {
    /// Email address; may be used to sign in.
    pub email: String,
    /// Plain-text password; only its salted hash is stored.
    pub password: String,
    /// Display name.
    pub name: String,
    /// Phone number in international format.
    pub phone_number: String,
    /// Preferred username; may be used to sign in.
    pub preferred_username: String,
    /// Role group the account joins.
    pub role: Role,
}

/// Identity provider.
///
/// Owns accounts, confirmation codes and sessions.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the provider can be shared as
/// `Arc<dyn IdentityProvider>`.
pub trait IdentityProvider: Send + Sync {
    /// Create an unconfirmed account and send it a confirmation code.
    ///
    /// Returns the generated username.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidSignUp`](crate::AuthError::InvalidSignUp) if a field is invalid
    /// - [`AuthError::UserAlreadyExists`](crate::AuthError::UserAlreadyExists) if the email
    ///   or preferred username is taken
    fn sign_up(&self, request: SignUpRequest) -> AuthFuture<'_, String>;

    /// Confirm an account with the code it was sent.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `AlreadyConfirmed`, `CodeMismatch` or `CodeExpired`.
    fn confirm_sign_up<'a>(&'a self, username: &'a str, code: &'a str) -> AuthFuture<'a, ()>;

    /// Issue and send a fresh confirmation code.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or `AlreadyConfirmed`.
    fn resend_code<'a>(&'a self, username: &'a str) -> AuthFuture<'a, ()>;

    /// Sign in by username, email or preferred username.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`](crate::AuthError::InvalidCredentials) for an
    ///   unknown identifier or wrong password
    /// - [`AuthError::UserNotConfirmed`](crate::AuthError::UserNotConfirmed) for a correct
    ///   password on an unconfirmed account
    fn authenticate<'a>(&'a self, identifier: &'a str, password: &'a str) -> AuthFuture<'a, Session>;

    /// Look up a live session.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` or `SessionExpired`.
    fn resolve_session(&self, session_id: SessionId) -> AuthFuture<'_, Session>;

    /// Revoke a session. Revoking an unknown session is not an error.
    ///
    /// # Errors
    ///
    /// Implementations backed by remote services may fail to reach them.
    fn sign_out(&self, session_id: SessionId) -> AuthFuture<'_, ()>;
}

/// Delivery channel for confirmation codes.
pub trait CodeDelivery: Send + Sync {
    /// Send `code` to the account identified by `username` at `email`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DeliveryFailed`](crate::AuthError::DeliveryFailed) if the
    /// channel rejects the message.
    fn send_confirmation_code<'a>(&'a self, username: &'a str, email: &'a str, code: &'a str)
    -> AuthFuture<'a, ()>;
}
