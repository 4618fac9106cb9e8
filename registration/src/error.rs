//! Service error taxonomy and its HTTP mapping.

use crate::types::EventId;
use eventreg_auth::AuthError;
use eventreg_core::StoreError;
use eventreg_web::AppError;
use thiserror::Error;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors returned by the event, registration and ticket services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Identity or session failure.
    #[error(transparent)]
    Auth(AuthError),

    /// The caller lacks the role or ownership the operation needs.
    #[error("Access denied: {reason}")]
    AccessDenied {
        /// What was missing.
        reason: String,
    },

    /// The data store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The attendee is already registered for the event.
    #[error("Already registered for event {event_id}")]
    DuplicateRegistration {
        /// Event the attendee is registered for.
        event_id: EventId,
    },

    /// No event with this id.
    #[error("Event {0} not found")]
    EventNotFound(EventId),

    /// No registration carries this ticket.
    #[error("Ticket {0} not found")]
    TicketNotFound(String),

    /// The event has no seats left.
    #[error("Event {0} is full")]
    EventFull(EventId),

    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Stored records contradict each other or cannot be decoded.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}

impl ServiceError {
    /// Build a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AccessDenied { required } => Self::AccessDenied {
                reason: format!("{required} role required"),
            },
            other => Self::Auth(other),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) | StoreError::Backend(msg) => Self::StoreUnavailable(msg),
            other => Self::DataIntegrity(other.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Auth(auth) => auth.into(),
            ServiceError::AccessDenied { .. } => Self::forbidden(message).with_code("ACCESS_DENIED"),
            ServiceError::StoreUnavailable(_) => Self::unavailable("Data store unavailable")
                .with_code("STORE_UNAVAILABLE")
                .with_source(err.into()),
            ServiceError::DuplicateRegistration { .. } => {
                Self::conflict(message).with_code("DUPLICATE_REGISTRATION")
            }
            ServiceError::EventFull(_) => Self::conflict(message).with_code("EVENT_FULL"),
            ServiceError::EventNotFound(_) => Self::not_found(message).with_code("EVENT_NOT_FOUND"),
            ServiceError::TicketNotFound(_) => Self::not_found(message).with_code("TICKET_NOT_FOUND"),
            ServiceError::Validation(_) => Self::validation(message),
            ServiceError::DataIntegrity(_) => Self::internal("Stored data is inconsistent")
                .with_code("DATA_INTEGRITY")
                .with_source(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn store_errors_split_into_outage_and_integrity() {
        assert!(matches!(
            ServiceError::from(StoreError::Unavailable("down".into())),
            ServiceError::StoreUnavailable(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::Serialization("bad".into())),
            ServiceError::DataIntegrity(_)
        ));
    }

    #[test]
    fn role_failures_become_access_denied() {
        let err = ServiceError::from(AuthError::AccessDenied {
            required: "organizers".into(),
        });
        assert_eq!(
            err,
            ServiceError::AccessDenied {
                reason: "organizers role required".into()
            }
        );
    }

    #[test]
    fn http_status_mapping() {
        let cases = [
            (ServiceError::validation("x"), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::Auth(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (ServiceError::AccessDenied { reason: "x".into() }, StatusCode::FORBIDDEN),
            (ServiceError::EventNotFound("e".into()), StatusCode::NOT_FOUND),
            (ServiceError::TicketNotFound("t".into()), StatusCode::NOT_FOUND),
            (ServiceError::DuplicateRegistration { event_id: "e".into() }, StatusCode::CONFLICT),
            (ServiceError::EventFull("e".into()), StatusCode::CONFLICT),
            (ServiceError::StoreUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ServiceError::DataIntegrity("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }
}
