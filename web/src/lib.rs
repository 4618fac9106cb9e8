//! Axum web framework integration for the event registration system.
//!
//! Shared HTTP plumbing used by the registration API:
//!
//! - [`AppError`]: domain errors to JSON error responses
//! - [`CorrelationId`] and [`BearerToken`] extractors
//! - [`middleware::correlation_id`] request tracking
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract** the bearer token and resolve the caller's session
//! 3. **Check role** and call the service operation
//! 4. **Map result** to a JSON response, or an [`AppError`] envelope
//!
//! # Example
//!
//! ```ignore
//! use eventreg_web::{AppError, BearerToken};
//!
//! async fn my_registrations(
//!     State(state): State<AppState>,
//!     token: BearerToken,
//! ) -> Result<Json<Vec<Registration>>, AppError> {
//!     let session = state.session(&token).await?;
//!     Ok(Json(state.registrations.list_by_attendee(&session.subject).await?))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod middleware;

// Re-export key types for convenience
pub use error::{AppError, ErrorResponse};
pub use extractors::{BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
