//! Typed records over the untyped [`DataStore`].
//!
//! [`RecordStore`] converts [`Event`] and [`Registration`] values to and from
//! store items and names the attributes the services filter and count on.

use crate::types::{Event, EventId, Registration, RegistrationId};
use eventreg_core::{DataStore, Filter, Increment, Item, PutCondition, StoreError, Table};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Attribute names used in filters, conditions and increments.
pub mod attr {
    /// Event key, also carried by registrations.
    pub const EVENT_ID: &str = "EventID";
    /// Event owner.
    pub const ORGANIZER_ID: &str = "OrganizerID";
    /// Event capacity.
    pub const MAX_ATTENDEES: &str = "MaxAttendees";
    /// Event registration counter.
    pub const CURRENT_ATTENDEES: &str = "CurrentAttendees";
    /// Registering attendee.
    pub const ATTENDEE_ID: &str = "AttendeeID";
    /// Ticket presented at the door.
    pub const TICKET_ID: &str = "TicketID";
}

fn encode<T: Serialize>(record: &T) -> Result<Item, StoreError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(item)) => Ok(item),
        Ok(other) => Err(StoreError::Serialization(format!("expected an object, got {other}"))),
        Err(e) => Err(StoreError::Serialization(e.to_string())),
    }
}

fn decode<T: DeserializeOwned>(item: Item) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(item)).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Typed access to the events and registrations tables.
#[derive(Clone)]
pub struct RecordStore {
    store: Arc<dyn DataStore>,
}

impl RecordStore {
    /// Wrap a data store.
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Write an event.
    ///
    /// # Errors
    ///
    /// Propagates store failures, including `ConditionFailed`.
    pub async fn put_event(&self, event: &Event, condition: PutCondition) -> Result<(), StoreError> {
        self.store.put(Table::Events, encode(event)?, condition).await
    }

    /// Fetch an event by id.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the stored item is not an event.
    pub async fn event(&self, event_id: &EventId) -> Result<Option<Event>, StoreError> {
        self.store
            .get(Table::Events, event_id.as_str())
            .await?
            .map(decode)
            .transpose()
    }

    /// Events matching `filter`.
    ///
    /// # Errors
    ///
    /// Propagates store and decoding failures.
    pub async fn events(&self, filter: Filter) -> Result<Vec<Event>, StoreError> {
        self.store
            .scan(Table::Events, filter)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Atomically add one attendee, refusing to pass `MaxAttendees`.
    ///
    /// Returns the new count.
    ///
    /// # Errors
    ///
    /// - `ConditionFailed` if the event is already at capacity
    /// - `ItemNotFound` if the event does not exist
    pub async fn add_attendee(&self, event_id: &EventId) -> Result<i64, StoreError> {
        let increment = Increment::new(attr::CURRENT_ATTENDEES, 1).with_ceiling(attr::MAX_ATTENDEES);
        self.store.update(Table::Events, event_id.as_str(), increment).await
    }

    /// Write a registration.
    ///
    /// # Errors
    ///
    /// Propagates store failures, including `ConditionFailed`.
    pub async fn put_registration(
        &self,
        registration: &Registration,
        condition: PutCondition,
    ) -> Result<(), StoreError> {
        self.store
            .put(Table::Registrations, encode(registration)?, condition)
            .await
    }

    /// Registrations matching `filter`.
    ///
    /// # Errors
    ///
    /// Propagates store and decoding failures.
    pub async fn registrations(&self, filter: Filter) -> Result<Vec<Registration>, StoreError> {
        self.store
            .scan(Table::Registrations, filter)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Delete a registration; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn delete_registration(&self, registration_id: &RegistrationId) -> Result<bool, StoreError> {
        self.store
            .delete(Table::Registrations, registration_id.as_str())
            .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::types::{RegistrationStatus, TicketId};
    use chrono::{TimeZone, Utc};
    use eventreg_testing::InMemoryDataStore;

    fn event(max: u32) -> Event {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Event {
            event_id: EventId::new("event_1"),
            organizer_id: "org-1".into(),
            title: "T".into(),
            description: "D".into(),
            date: now,
            location: "L".into(),
            category: "General".into(),
            max_attendees: max,
            current_attendees: 0,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn events_round_trip_through_items() {
        let records = RecordStore::new(Arc::new(InMemoryDataStore::new()));
        records.put_event(&event(2), PutCondition::KeyNotExists).await.unwrap();

        let loaded = records.event(&EventId::new("event_1")).await.unwrap().unwrap();
        assert_eq!(loaded, event(2));
        assert!(records.event(&EventId::new("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_attendee_stops_at_capacity() {
        let records = RecordStore::new(Arc::new(InMemoryDataStore::new()));
        records.put_event(&event(1), PutCondition::KeyNotExists).await.unwrap();
        let id = EventId::new("event_1");

        assert_eq!(records.add_attendee(&id).await.unwrap(), 1);
        assert!(matches!(records.add_attendee(&id).await, Err(StoreError::ConditionFailed(_))));
        assert_eq!(records.event(&id).await.unwrap().unwrap().current_attendees, 1);
    }

    #[tokio::test]
    async fn undecodable_items_surface_as_serialization_errors() {
        let store = InMemoryDataStore::new();
        let mut item = Item::new();
        item.insert(attr::EVENT_ID.into(), "event_bad".into());
        store.seed(Table::Events, item).await.unwrap();

        let records = RecordStore::new(Arc::new(store));
        let err = records.event(&EventId::new("event_bad")).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn registrations_filter_and_delete() {
        let records = RecordStore::new(Arc::new(InMemoryDataStore::new()));
        let registration = Registration {
            registration_id: RegistrationId::new("reg_1"),
            ticket_id: TicketId::new("TICKET_1_AAAAAAAA"),
            event_id: EventId::new("event_1"),
            attendee_id: "att-1".into(),
            attendee_name: "A".into(),
            attendee_email: "a@example.com".into(),
            status: RegistrationStatus::Confirmed,
            registered_at: Utc::now(),
        };
        records.put_registration(&registration, PutCondition::KeyNotExists).await.unwrap();

        let found = records
            .registrations(Filter::new().equals(attr::TICKET_ID, "TICKET_1_AAAAAAAA"))
            .await
            .unwrap();
        assert_eq!(found, vec![registration.clone()]);

        assert!(records.delete_registration(&registration.registration_id).await.unwrap());
        assert!(records.registrations(Filter::new()).await.unwrap().is_empty());
    }
}
