//! Ticket validation.

use crate::error::{Result, ServiceError};
use crate::ids::normalize_ticket_input;
use crate::metrics;
use crate::store::{RecordStore, attr};
use crate::types::ValidatedTicket;
use eventreg_core::Filter;
use eventreg_core::environment::Clock;
use std::sync::Arc;

/// Looks up tickets and joins them with their event. Never writes.
#[derive(Clone)]
pub struct TicketService {
    records: RecordStore,
    clock: Arc<dyn Clock>,
}

impl TicketService {
    /// Create the service.
    #[must_use]
    pub fn new(records: RecordStore, clock: Arc<dyn Clock>) -> Self {
        Self { records, clock }
    }

    /// Validate user-entered ticket text.
    ///
    /// The input is trimmed and upper-cased before lookup, so tickets match
    /// regardless of case.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] for blank input
    /// - [`ServiceError::TicketNotFound`] if no registration carries the ticket
    /// - [`ServiceError::DataIntegrity`] if more than one does
    /// - [`ServiceError::EventNotFound`] if the ticket's event no longer exists
    pub async fn validate(&self, ticket_input: &str) -> Result<ValidatedTicket> {
        let result = self.lookup(ticket_input).await;
        metrics::record_ticket_validation(match &result {
            Ok(_) => "valid",
            Err(ServiceError::TicketNotFound(_)) => "not_found",
            Err(ServiceError::EventNotFound(_)) => "orphaned",
            Err(ServiceError::DataIntegrity(_)) => "conflict",
            Err(_) => "error",
        });
        result
    }

    async fn lookup(&self, ticket_input: &str) -> Result<ValidatedTicket> {
        let ticket_id =
            normalize_ticket_input(ticket_input).ok_or_else(|| ServiceError::validation("ticket id is required"))?;

        let mut matches = self
            .records
            .registrations(Filter::new().equals(attr::TICKET_ID, ticket_id.as_str()))
            .await?;
        let registration = match matches.len() {
            0 => {
                tracing::info!(%ticket_id, "Ticket not found");
                return Err(ServiceError::TicketNotFound(ticket_id.to_string()));
            }
            1 => matches.remove(0),
            n => {
                tracing::error!(%ticket_id, registrations = n, "Ticket shared by several registrations");
                return Err(ServiceError::DataIntegrity(format!(
                    "ticket {ticket_id} belongs to {n} registrations"
                )));
            }
        };

        let event = self
            .records
            .event(&registration.event_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(%ticket_id, event_id = %registration.event_id, "Ticket references a missing event");
                ServiceError::EventNotFound(registration.event_id.clone())
            })?;

        let timing = event.timing(self.clock.now());
        tracing::info!(%ticket_id, event_id = %event.event_id, %timing, "Ticket validated");
        Ok(ValidatedTicket {
            registration,
            event,
            timing,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use eventreg_testing::{InMemoryDataStore, test_clock};

    #[tokio::test]
    async fn blank_ticket_is_a_validation_error() {
        let service = TicketService::new(RecordStore::new(Arc::new(InMemoryDataStore::new())), Arc::new(test_clock()));
        assert!(matches!(service.validate("   ").await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_ticket_reports_normalized_id() {
        let service = TicketService::new(RecordStore::new(Arc::new(InMemoryDataStore::new())), Arc::new(test_clock()));
        assert_eq!(
            service.validate(" ticket_1_abc ").await.unwrap_err(),
            ServiceError::TicketNotFound("TICKET_1_ABC".to_string())
        );
    }
}
