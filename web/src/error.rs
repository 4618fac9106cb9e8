//! Error types for web handlers.
//!
//! [`AppError`] bridges domain errors and HTTP responses by implementing
//! Axum's `IntoResponse`. The body is always `{"code": ..., "message": ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use eventreg_auth::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(Path(id): Path<String>) -> Result<Json<Event>, AppError> {
///     let event = events
///         .get(&id)
///         .await?
///         .ok_or_else(|| AppError::not_found(format!("Event {id} not found")).with_code("EVENT_NOT_FOUND"))?;
///     Ok(Json(event))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN")
    }

    /// 404; pair with [`with_code`](Self::with_code) to name what is missing.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message, "CONFLICT")
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "VALIDATION_ERROR")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_SERVER_ERROR")
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message, "SERVICE_UNAVAILABLE")
    }

    /// Replace the generic code with a domain-specific one, keeping the status.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error code (for client error handling).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::InvalidCredentials => Self::unauthorized(message).with_code("INVALID_CREDENTIALS"),
            AuthError::UserNotConfirmed { .. } => Self::forbidden(message).with_code("USER_NOT_CONFIRMED"),
            AuthError::SessionExpired | AuthError::SessionNotFound => {
                Self::unauthorized(message).with_code("SESSION_INVALID")
            }
            AuthError::AccessDenied { .. } => Self::forbidden(message).with_code("ACCESS_DENIED"),
            AuthError::InvalidSignUp { .. } => Self::validation(message),
            AuthError::UserAlreadyExists { .. } | AuthError::AlreadyConfirmed => Self::conflict(message),
            AuthError::UserNotFound => Self::not_found(message).with_code("USER_NOT_FOUND"),
            AuthError::CodeMismatch | AuthError::CodeExpired => {
                Self::validation(message).with_code("INVALID_CODE")
            }
            AuthError::DeliveryFailed(_) => {
                Self::unavailable("Confirmation code could not be delivered").with_source(err.into())
            }
            AuthError::PasswordHash(_) => Self::internal("Password could not be processed").with_source(err.into()),
            AuthError::Store(_) => Self::unavailable("User store unavailable").with_source(err.into()),
        }
    }
}
