//! Ticket validation tests.
//!
//! Covers case-insensitive lookup, unknown and blank input, orphaned
//! tickets and tickets held by more than one registration.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use chrono::Duration;
use common::{harness, new_event};
use eventreg_core::{Item, Table};
use registration::{EventTiming, ServiceError};
use serde_json::{Value, json};

fn item(value: Value) -> Item {
    match value {
        Value::Object(map) => map,
        other => unreachable!("fixture must be an object, got {other}"),
    }
}

#[tokio::test]
async fn test_ticket_lookup_ignores_case_and_whitespace() {
    let h = harness();
    let services = h.app.services();
    let event = services
        .events
        .create_event("organizer-1", new_event("Gala", &h.clock, 3, 10))
        .await
        .unwrap();
    let receipt = services
        .registrations
        .register(&event.event_id, "attendee-1", "Ada", "ada@example.com")
        .await
        .unwrap();

    let typed = format!("  {}  ", receipt.ticket_id.as_str().to_lowercase());
    let validated = services.tickets.validate(&typed).await.unwrap();
    assert_eq!(validated.registration.ticket_id, receipt.ticket_id);
    assert_eq!(validated.event.title, "Gala");
    assert_eq!(validated.timing, EventTiming::Upcoming);

    h.clock.advance(Duration::days(3));
    let on_the_day = services.tickets.validate(receipt.ticket_id.as_str()).await.unwrap();
    assert_eq!(on_the_day.timing, EventTiming::Today);

    h.clock.advance(Duration::days(2));
    let afterwards = services.tickets.validate(receipt.ticket_id.as_str()).await.unwrap();
    assert_eq!(afterwards.timing, EventTiming::Past);
}

#[tokio::test]
async fn test_unknown_and_blank_tickets() {
    let h = harness();
    let tickets = &h.app.services().tickets;

    assert_eq!(
        tickets.validate("ticket_123_abc").await,
        Err(ServiceError::TicketNotFound("TICKET_123_ABC".to_string()))
    );
    assert!(matches!(tickets.validate("   ").await, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn test_orphaned_ticket_reports_missing_event() {
    let h = harness();
    h.store
        .seed(
            Table::Registrations,
            item(json!({
                "RegistrationID": "reg_1_orphan",
                "TicketID": "TICKET_1_ORPHAN1",
                "EventID": "event_1_gone",
                "AttendeeID": "attendee-1",
                "AttendeeName": "Ada",
                "AttendeeEmail": "ada@example.com",
                "Status": "CONFIRMED",
                "RegisteredAt": "2025-01-01T00:00:00Z"
            })),
        )
        .await
        .unwrap();

    let result = h.app.services().tickets.validate("ticket_1_orphan1").await;
    assert!(matches!(result, Err(ServiceError::EventNotFound(id)) if id.as_str() == "event_1_gone"));
}

#[tokio::test]
async fn test_ticket_held_twice_is_a_data_integrity_error() {
    let h = harness();
    let services = h.app.services();
    let event = services
        .events
        .create_event("organizer-1", new_event("Gala", &h.clock, 3, 10))
        .await
        .unwrap();

    for (registration_id, attendee) in [("reg_1_a", "attendee-1"), ("reg_1_b", "attendee-2")] {
        h.store
            .seed(
                Table::Registrations,
                item(json!({
                    "RegistrationID": registration_id,
                    "TicketID": "TICKET_1_SHARED01",
                    "EventID": event.event_id.as_str(),
                    "AttendeeID": attendee,
                    "AttendeeName": attendee,
                    "AttendeeEmail": format!("{attendee}@example.com"),
                    "Status": "CONFIRMED",
                    "RegisteredAt": "2025-01-01T00:00:00Z"
                })),
            )
            .await
            .unwrap();
    }

    let result = services.tickets.validate("TICKET_1_SHARED01").await;
    assert!(matches!(result, Err(ServiceError::DataIntegrity(_))));
}
