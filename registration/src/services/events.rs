//! Event creation, lookup and catalog queries.

use crate::catalog::{EventQuery, EventSummary, OrganizerOverview, OrganizerStats, sort_events, SortOrder};
use crate::error::{Result, ServiceError};
use crate::ids::IdMinter;
use crate::metrics;
use crate::store::{RecordStore, attr};
use crate::types::{DEFAULT_CATEGORY, Event, EventId, NewEvent};
use chrono::{DateTime, Utc};
use eventreg_core::environment::Clock;
use eventreg_core::{Filter, PutCondition, StoreError};
use std::sync::Arc;

/// Event operations.
#[derive(Clone)]
pub struct EventService {
    records: RecordStore,
    clock: Arc<dyn Clock>,
    ids: IdMinter,
}

impl EventService {
    /// Create the service.
    #[must_use]
    pub fn new(records: RecordStore, clock: Arc<dyn Clock>, ids: IdMinter) -> Self {
        Self { records, clock, ids }
    }

    /// Create an event owned by `organizer_id`.
    ///
    /// Title, description and location must be non-blank and the capacity at
    /// least 1. A blank category becomes `"General"`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] for a missing field or zero capacity
    /// - [`ServiceError::StoreUnavailable`] if the store cannot be reached
    pub async fn create_event(&self, organizer_id: &str, new_event: NewEvent) -> Result<Event> {
        validate_new_event(organizer_id, &new_event)?;

        let category = new_event
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let event = Event {
            event_id: self.ids.event_id(),
            organizer_id: organizer_id.to_string(),
            title: new_event.title.trim().to_string(),
            description: new_event.description.trim().to_string(),
            date: new_event.date,
            location: new_event.location.trim().to_string(),
            category,
            max_attendees: new_event.max_attendees,
            current_attendees: 0,
            created_at: self.clock.now(),
        };

        match self.records.put_event(&event, PutCondition::KeyNotExists).await {
            Ok(()) => {}
            Err(StoreError::ConditionFailed(reason)) => {
                return Err(ServiceError::DataIntegrity(format!(
                    "event id {} already in use: {reason}",
                    event.event_id
                )));
            }
            Err(e) => return Err(e.into()),
        }

        metrics::record_event_created();
        tracing::info!(
            event_id = %event.event_id,
            organizer_id = %event.organizer_id,
            max_attendees = event.max_attendees,
            "Event created"
        );
        Ok(event)
    }

    /// Fetch one event.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::EventNotFound`] if no event has this id.
    pub async fn get_event(&self, event_id: &EventId) -> Result<Event> {
        self.records
            .event(event_id)
            .await?
            .ok_or_else(|| ServiceError::EventNotFound(event_id.clone()))
    }

    /// Every event, soonest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::StoreUnavailable`] if the store cannot be reached.
    pub async fn list_events(&self) -> Result<Vec<Event>> {
        let mut events = self.records.events(Filter::new()).await?;
        sort_events(&mut events, SortOrder::Date);
        Ok(events)
    }

    /// Events owned by `organizer_id`, soonest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::StoreUnavailable`] if the store cannot be reached.
    pub async fn list_by_organizer(&self, organizer_id: &str) -> Result<Vec<Event>> {
        let mut events = self
            .records
            .events(Filter::new().equals(attr::ORGANIZER_ID, organizer_id))
            .await?;
        sort_events(&mut events, SortOrder::Date);
        Ok(events)
    }

    /// Catalog search evaluated at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::StoreUnavailable`] if the store cannot be reached.
    pub async fn search(&self, query: &EventQuery, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let events = self.records.events(Filter::new()).await?;
        let selected = query.apply(events, now);
        tracing::debug!(results = selected.len(), ?query, "Catalog search");
        Ok(selected)
    }

    /// The organizer's events, each with its registration count, plus
    /// dashboard counters.
    ///
    /// Counts come from the registrations table rather than the event's
    /// counter.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::StoreUnavailable`] if the store cannot be reached.
    pub async fn organizer_overview(&self, organizer_id: &str, now: DateTime<Utc>) -> Result<OrganizerOverview> {
        let events = self.list_by_organizer(organizer_id).await?;

        let counts = futures::future::try_join_all(events.iter().map(|event| {
            self.records
                .registrations(Filter::new().equals(attr::EVENT_ID, event.event_id.as_str()))
        }))
        .await?;

        let summaries: Vec<EventSummary> = events
            .into_iter()
            .zip(counts)
            .map(|(event, registrations)| EventSummary {
                registration_count: registrations.len(),
                timing: event.timing(now),
                event,
            })
            .collect();
        let stats = OrganizerStats::from_summaries(&summaries, now);

        Ok(OrganizerOverview {
            events: summaries,
            stats,
        })
    }
}

fn validate_new_event(organizer_id: &str, new_event: &NewEvent) -> Result<()> {
    if organizer_id.trim().is_empty() {
        return Err(ServiceError::validation("organizer id is required"));
    }
    for (field, value) in [
        ("title", &new_event.title),
        ("description", &new_event.description),
        ("location", &new_event.location),
    ] {
        if value.trim().is_empty() {
            return Err(ServiceError::validation(format!("{field} is required")));
        }
    }
    if new_event.max_attendees == 0 {
        return Err(ServiceError::validation("max attendees must be at least 1"));
    }
    Ok(())
}
