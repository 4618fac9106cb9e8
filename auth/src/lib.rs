//! # Eventreg Authentication & Authorization
//!
//! Identity, sessions and role checks for the event registration portals.
//!
//! ## Features
//!
//! - **Accounts**: sign-up with email confirmation codes, sign-in by
//!   username, email or preferred username
//! - **Roles**: `attendees` and `organizers` groups, checked with [`require_role`]
//! - **Sessions**: opaque bearer tokens with a fixed lifetime
//! - **Testable**: the identity provider is a trait; mocks live in [`mocks`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use eventreg_auth::*;
//!
//! let session = provider.authenticate("ada@example.com", "password123").await?;
//! require_role(&session, Role::Attendee)?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod error;
pub mod providers;
pub mod session;
pub mod utils;

// Test utilities
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-exports
pub use config::IdentityConfig;
pub use error::{AuthError, Result};
pub use providers::{CodeDelivery, IdentityProvider, SignUpRequest};
pub use session::{Role, Session, SessionId, require_role};
