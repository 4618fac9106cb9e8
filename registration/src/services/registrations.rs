//! Registration workflow.
//!
//! [`RegistrationService::register`] keeps two invariants under concurrency:
//!
//! 1. At most one registration per `(EventID, AttendeeID)`. A scan catches the
//!    common case; the conditional put closes the race between two requests
//!    that both passed the scan.
//! 2. `CurrentAttendees` never exceeds `MaxAttendees` and equals the number of
//!    stored registrations. The counter only moves through the store's atomic
//!    increment with a ceiling; a rejected increment deletes the registration
//!    that was just written.

use crate::error::{Result, ServiceError};
use crate::ids::IdMinter;
use crate::metrics;
use crate::store::{RecordStore, attr};
use crate::types::{EventId, Registration, RegistrationReceipt, RegistrationStatus};
use eventreg_core::environment::Clock;
use eventreg_core::{Filter, PutCondition, StoreError};
use std::sync::Arc;

/// Registration operations.
#[derive(Clone)]
pub struct RegistrationService {
    records: RecordStore,
    clock: Arc<dyn Clock>,
    ids: IdMinter,
}

impl RegistrationService {
    /// Create the service.
    #[must_use]
    pub fn new(records: RecordStore, clock: Arc<dyn Clock>, ids: IdMinter) -> Self {
        Self { records, clock, ids }
    }

    /// Register `attendee_id` for `event_id`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] for an empty id or name, or an email without `@`
    /// - [`ServiceError::EventNotFound`] if the event does not exist
    /// - [`ServiceError::DuplicateRegistration`] if the attendee is already registered
    /// - [`ServiceError::EventFull`] if no seat is left
    /// - [`ServiceError::StoreUnavailable`] if the store cannot be reached
    pub async fn register(
        &self,
        event_id: &EventId,
        attendee_id: &str,
        attendee_name: &str,
        attendee_email: &str,
    ) -> Result<RegistrationReceipt> {
        let result = self
            .try_register(event_id, attendee_id, attendee_name, attendee_email)
            .await;
        metrics::record_registration(match &result {
            Ok(_) => "confirmed",
            Err(ServiceError::DuplicateRegistration { .. }) => "duplicate",
            Err(ServiceError::EventFull(_)) => "full",
            Err(_) => "rejected",
        });
        result
    }

    async fn try_register(
        &self,
        event_id: &EventId,
        attendee_id: &str,
        attendee_name: &str,
        attendee_email: &str,
    ) -> Result<RegistrationReceipt> {
        validate_attendee(event_id, attendee_id, attendee_name, attendee_email)?;

        let event = self
            .records
            .event(event_id)
            .await?
            .ok_or_else(|| ServiceError::EventNotFound(event_id.clone()))?;
        let existing = self
            .records
            .registrations(
                Filter::new()
                    .equals(attr::EVENT_ID, event_id.as_str())
                    .equals(attr::ATTENDEE_ID, attendee_id),
            )
            .await?;
        if !existing.is_empty() {
            tracing::info!(%event_id, attendee_id, "Duplicate registration rejected");
            return Err(ServiceError::DuplicateRegistration {
                event_id: event_id.clone(),
            });
        }

        if event.is_full() {
            tracing::info!(%event_id, max_attendees = event.max_attendees, "Event is full");
            return Err(ServiceError::EventFull(event_id.clone()));
        }

        let registration = Registration {
            registration_id: self.ids.registration_id(),
            ticket_id: self.ids.ticket_id(),
            event_id: event_id.clone(),
            attendee_id: attendee_id.to_string(),
            attendee_name: attendee_name.trim().to_string(),
            attendee_email: attendee_email.trim().to_string(),
            status: RegistrationStatus::Confirmed,
            registered_at: self.clock.now(),
        };

        let unique = PutCondition::UniqueAttributes(vec![attr::EVENT_ID.to_string(), attr::ATTENDEE_ID.to_string()]);
        match self.records.put_registration(&registration, unique).await {
            Ok(()) => {}
            Err(StoreError::ConditionFailed(_)) => {
                tracing::info!(%event_id, attendee_id, "Concurrent duplicate registration rejected");
                return Err(ServiceError::DuplicateRegistration {
                    event_id: event_id.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(err) = self.records.add_attendee(event_id).await {
            return Err(self.compensate(&registration, err).await);
        }

        tracing::info!(
            %event_id,
            registration_id = %registration.registration_id,
            ticket_id = %registration.ticket_id,
            "Registration confirmed"
        );
        Ok(RegistrationReceipt {
            ticket_id: registration.ticket_id.clone(),
            registration,
        })
    }

    /// Undo a registration whose counter increment was rejected, and pick the
    /// error to report.
    async fn compensate(&self, registration: &Registration, cause: StoreError) -> ServiceError {
        let event_id = &registration.event_id;
        if let Err(delete_err) = self.records.delete_registration(&registration.registration_id).await {
            tracing::error!(
                %event_id,
                registration_id = %registration.registration_id,
                error = %delete_err,
                "Failed to remove registration after rejected increment"
            );
            return delete_err.into();
        }
        tracing::warn!(%event_id, error = %cause, "Attendee increment rejected, registration removed");
        match cause {
            StoreError::ConditionFailed(_) => ServiceError::EventFull(event_id.clone()),
            StoreError::ItemNotFound { .. } => ServiceError::EventNotFound(event_id.clone()),
            other => other.into(),
        }
    }

    /// Registrations held by `attendee_id`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::StoreUnavailable`] if the store cannot be reached.
    pub async fn list_by_attendee(&self, attendee_id: &str) -> Result<Vec<Registration>> {
        let mut registrations = self
            .records
            .registrations(Filter::new().equals(attr::ATTENDEE_ID, attendee_id))
            .await?;
        registrations.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(registrations)
    }

    /// Registrations for `event_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::StoreUnavailable`] if the store cannot be reached.
    pub async fn list_by_event(&self, event_id: &EventId) -> Result<Vec<Registration>> {
        let mut registrations = self
            .records
            .registrations(Filter::new().equals(attr::EVENT_ID, event_id.as_str()))
            .await?;
        registrations.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(registrations)
    }

    /// Registrations for an event, visible only to the organizer who owns it.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::EventNotFound`] if the event does not exist
    /// - [`ServiceError::AccessDenied`] if `organizer_id` does not own it
    pub async fn list_for_organizer(&self, organizer_id: &str, event_id: &EventId) -> Result<Vec<Registration>> {
        let event = self
            .records
            .event(event_id)
            .await?
            .ok_or_else(|| ServiceError::EventNotFound(event_id.clone()))?;
        if event.organizer_id != organizer_id {
            tracing::warn!(%event_id, organizer_id, "Registration list denied to non-owner");
            return Err(ServiceError::AccessDenied {
                reason: "only the event's organizer may list its registrations".to_string(),
            });
        }
        self.list_by_event(event_id).await
    }
}

fn validate_attendee(event_id: &EventId, attendee_id: &str, name: &str, email: &str) -> Result<()> {
    if event_id.as_str().trim().is_empty() {
        return Err(ServiceError::validation("event id is required"));
    }
    if attendee_id.trim().is_empty() {
        return Err(ServiceError::validation("attendee id is required"));
    }
    if name.trim().is_empty() {
        return Err(ServiceError::validation("attendee name is required"));
    }
    if !email.contains('@') {
        return Err(ServiceError::validation("attendee email must contain '@'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use eventreg_testing::{InMemoryDataStore, SequentialIdGenerator, test_clock};

    fn service() -> RegistrationService {
        let clock: Arc<dyn Clock> = Arc::new(test_clock());
        let ids = IdMinter::new(Arc::clone(&clock), Arc::new(SequentialIdGenerator::new()));
        RegistrationService::new(RecordStore::new(Arc::new(InMemoryDataStore::new())), clock, ids)
    }

    #[tokio::test]
    async fn input_validation_precedes_store_access() {
        let service = service();
        let event = EventId::new("event_1");

        for (event_id, attendee, name, email) in [
            (EventId::new(""), "att", "Ada", "ada@example.com"),
            (event.clone(), " ", "Ada", "ada@example.com"),
            (event.clone(), "att", "  ", "ada@example.com"),
            (event.clone(), "att", "Ada", "ada.example.com"),
        ] {
            let err = service.register(&event_id, attendee, name, email).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn unknown_event() {
        let err = service()
            .register(&EventId::new("event_x"), "att", "Ada", "ada@example.com")
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::EventNotFound(EventId::new("event_x")));
    }

    #[tokio::test]
    async fn empty_listings_are_not_errors() {
        let service = service();
        assert!(service.list_by_attendee("nobody").await.unwrap().is_empty());
        assert!(service.list_by_event(&EventId::new("event_x")).await.unwrap().is_empty());
    }
}
