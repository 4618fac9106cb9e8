//! Domain types for the event registration system.
//!
//! Records are persisted with the `PascalCase` attribute names used by the
//! data store tables (`EventID`, `MaxAttendees`, ...). Request and response
//! bodies of the HTTP API use `snake_case`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Wrap an existing `", stringify!($name), "` value.")]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Event identifier, `event_<unix-millis>_<9 base36 chars>`.
    EventId
);

string_id!(
    /// Registration identifier, `reg_<unix-millis>_<9 base36 chars>`.
    RegistrationId
);

string_id!(
    /// Ticket identifier, `TICKET_<unix-millis>_<8 uppercase base36 chars>`.
    ///
    /// Always stored upper-case; lookups normalize their input first.
    TicketId
);

// ============================================================================
// Events
// ============================================================================

/// Category given to events created without one.
pub const DEFAULT_CATEGORY: &str = "General";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// An event created by an organizer.
///
/// `current_attendees` only ever changes through the store's atomic
/// increment; no other field changes after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    /// Event identifier.
    #[serde(rename = "EventID")]
    pub event_id: EventId,
    /// Subject of the organizer who created the event.
    #[serde(rename = "OrganizerID")]
    pub organizer_id: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// When the event takes place.
    pub date: DateTime<Utc>,
    /// Where the event takes place.
    pub location: String,
    /// Category, `"General"` when not given.
    #[serde(default = "default_category")]
    pub category: String,
    /// Capacity, at least 1.
    pub max_attendees: u32,
    /// Registrations counted so far.
    #[serde(default)]
    pub current_attendees: u32,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event has reached its capacity.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current_attendees >= self.max_attendees
    }

    /// Seats still available.
    #[must_use]
    pub const fn available_spots(&self) -> u32 {
        self.max_attendees.saturating_sub(self.current_attendees)
    }

    /// Share of the capacity taken, as a rounded percentage.
    #[must_use]
    pub fn fill_percentage(&self) -> u32 {
        if self.max_attendees == 0 {
            return 0;
        }
        let current = u64::from(self.current_attendees);
        let max = u64::from(self.max_attendees);
        u32::try_from((current * 100 + max / 2) / max).unwrap_or(u32::MAX)
    }

    /// Classify the event relative to `now`.
    ///
    /// Calendar days are compared in UTC.
    #[must_use]
    pub fn timing(&self, now: DateTime<Utc>) -> EventTiming {
        if self.date.date_naive() == now.date_naive() {
            EventTiming::Today
        } else if self.date < now {
            EventTiming::Past
        } else {
            EventTiming::Upcoming
        }
    }
}

/// Where an event sits relative to the current time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTiming {
    /// On a later calendar day.
    Upcoming,
    /// On the current calendar day.
    Today,
    /// On an earlier calendar day.
    Past,
}

impl fmt::Display for EventTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upcoming => write!(f, "upcoming"),
            Self::Today => write!(f, "today"),
            Self::Past => write!(f, "past"),
        }
    }
}

/// Details supplied by an organizer when creating an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// When the event takes place.
    pub date: DateTime<Utc>,
    /// Where the event takes place.
    pub location: String,
    /// Optional category.
    #[serde(default)]
    pub category: Option<String>,
    /// Capacity.
    pub max_attendees: u32,
}

// ============================================================================
// Registrations
// ============================================================================

/// Registration status. Registrations are created confirmed and never change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    /// The only status a registration can have.
    #[default]
    Confirmed,
}

/// An attendee's registration for an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Registration {
    /// Registration identifier.
    #[serde(rename = "RegistrationID")]
    pub registration_id: RegistrationId,
    /// Ticket presented at the door.
    #[serde(rename = "TicketID")]
    pub ticket_id: TicketId,
    /// Event registered for.
    #[serde(rename = "EventID")]
    pub event_id: EventId,
    /// Subject of the attendee.
    #[serde(rename = "AttendeeID")]
    pub attendee_id: String,
    /// Attendee display name.
    pub attendee_name: String,
    /// Attendee email.
    pub attendee_email: String,
    /// Status.
    #[serde(default)]
    pub status: RegistrationStatus,
    /// When the registration was made.
    pub registered_at: DateTime<Utc>,
}

/// Result of a successful registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    /// Ticket the attendee presents at the door.
    pub ticket_id: TicketId,
    /// The stored registration.
    pub registration: Registration,
}

/// A ticket joined with its event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedTicket {
    /// Registration the ticket belongs to.
    pub registration: Registration,
    /// Event the ticket admits to.
    pub event: Event,
    /// Event timing at validation time.
    pub timing: EventTiming,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn event(date: DateTime<Utc>, current: u32, max: u32) -> Event {
        Event {
            event_id: EventId::new("event_1"),
            organizer_id: "org-1".to_string(),
            title: "RustConf".to_string(),
            description: "Talks".to_string(),
            date,
            location: "Portland".to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            max_attendees: max,
            current_attendees: current,
            created_at: date,
        }
    }

    #[test]
    fn event_uses_store_attribute_names() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let value = serde_json::to_value(event(now, 1, 2)).unwrap();
        assert_eq!(value["EventID"], "event_1");
        assert_eq!(value["OrganizerID"], "org-1");
        assert_eq!(value["MaxAttendees"], 2);
        assert_eq!(value["CurrentAttendees"], 1);
    }

    #[test]
    fn event_defaults_category_and_counter() {
        let value = json!({
            "EventID": "event_1",
            "OrganizerID": "org-1",
            "Title": "T",
            "Description": "D",
            "Date": "2025-03-01T10:00:00Z",
            "Location": "L",
            "MaxAttendees": 5,
            "CreatedAt": "2025-01-01T00:00:00Z"
        });
        let event: Event = serde_json::from_value(value).unwrap();
        assert_eq!(event.category, "General");
        assert_eq!(event.current_attendees, 0);
    }

    #[test]
    fn capacity_helpers() {
        let now = Utc::now();
        let e = event(now, 1, 3);
        assert!(!e.is_full());
        assert_eq!(e.available_spots(), 2);
        assert_eq!(e.fill_percentage(), 33);
        assert!(event(now, 3, 3).is_full());
        assert_eq!(event(now, 2, 3).fill_percentage(), 67);
    }

    #[test]
    fn timing_classification() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(event(now - Duration::hours(2), 0, 1).timing(now), EventTiming::Today);
        assert_eq!(event(now + Duration::hours(2), 0, 1).timing(now), EventTiming::Today);
        assert_eq!(event(now - Duration::days(1), 0, 1).timing(now), EventTiming::Past);
        assert_eq!(event(now + Duration::days(1), 0, 1).timing(now), EventTiming::Upcoming);
    }

    #[test]
    fn registration_status_serializes_upper_case() {
        assert_eq!(serde_json::to_value(RegistrationStatus::Confirmed).unwrap(), "CONFIRMED");
    }
}
