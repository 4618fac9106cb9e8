//! Concurrent registration tests.
//!
//! Many attendees race for the last seats of an event, and one attendee
//! races against themself. The counter must equal the number of stored
//! registrations and never exceed capacity.
//!
//! Run with: `cargo test --test concurrency_test -- --nocapture`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use common::{harness, new_event};
use eventreg_core::Table;
use futures::future::join_all;
use registration::ServiceError;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifty_attendees_race_for_ten_seats() {
    let h = harness();
    let services = h.app.services().clone();
    let event = services
        .events
        .create_event("organizer-1", new_event("Popular Talk", &h.clock, 5, 10))
        .await
        .unwrap();

    let attempts = (0..50).map(|i| {
        let services = services.clone();
        let event_id = event.event_id.clone();
        tokio::spawn(async move {
            services
                .registrations
                .register(
                    &event_id,
                    &format!("attendee-{i}"),
                    &format!("Attendee {i}"),
                    &format!("attendee{i}@example.com"),
                )
                .await
        })
    });
    let results: Vec<_> = join_all(attempts).await.into_iter().map(Result::unwrap).collect();

    let confirmed = results.iter().filter(|r| r.is_ok()).count();
    let full = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::EventFull(_))))
        .count();
    println!("confirmed={confirmed} full={full}");
    assert_eq!(confirmed, 10);
    assert_eq!(full, 40);

    let stored = services.events.get_event(&event.event_id).await.unwrap();
    assert_eq!(stored.current_attendees, 10);
    assert_eq!(h.store.len(Table::Registrations).await, 10);

    let registrations = services.registrations.list_by_event(&event.event_id).await.unwrap();
    let mut tickets: Vec<_> = registrations.iter().map(|r| r.ticket_id.clone()).collect();
    tickets.sort();
    tickets.dedup();
    assert_eq!(tickets.len(), 10, "every ticket id is distinct");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicates_produce_one_registration() {
    let h = harness();
    let services = h.app.services().clone();
    let event = services
        .events
        .create_event("organizer-1", new_event("Workshop", &h.clock, 5, 100))
        .await
        .unwrap();

    let attempts = (0..20).map(|_| {
        let services = services.clone();
        let event_id = event.event_id.clone();
        tokio::spawn(async move {
            services
                .registrations
                .register(&event_id, "attendee-1", "Ada", "ada@example.com")
                .await
        })
    });
    let results: Vec<_> = join_all(attempts).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(ServiceError::DuplicateRegistration { .. })))
    );

    let stored = services.events.get_event(&event.event_id).await.unwrap();
    assert_eq!(stored.current_attendees, 1);
    assert_eq!(h.store.len(Table::Registrations).await, 1);
}
