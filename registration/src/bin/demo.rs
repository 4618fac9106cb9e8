//! Registration walkthrough.
//!
//! Runs a complete scenario against the in-memory store:
//! - An organizer publishes an event with two seats
//! - Two attendees register; a repeat registration is refused
//! - A third attendee finds the event full
//! - Door staff validate a ticket typed in lower case
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin demo
//! ```

use anyhow::{Context, bail};
use chrono::{Duration, Utc};
use eventreg_auth::mocks::RecordingCodeDelivery;
use eventreg_auth::{Role, SignUpRequest};
use eventreg_core::environment::{RandomIdGenerator, SystemClock};
use eventreg_testing::InMemoryDataStore;
use registration::{Config, EventRegApp, NewEvent, PortalSession, ServiceError, SignInOutcome};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PASSWORD: &str = "correct-horse-battery";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,registration=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n============================================");
    println!("   Event Registration - Live Demo");
    println!("============================================\n");

    let delivery = RecordingCodeDelivery::new();
    let app = EventRegApp::with_components(
        Config::default(),
        Arc::new(InMemoryDataStore::new()),
        Arc::new(delivery.clone()),
        Arc::new(SystemClock),
        Arc::new(RandomIdGenerator),
    );

    // Step 1: organizer publishes an event
    println!("1. Organizer publishes an event with 2 seats");
    let organizer = sign_up_and_in(&app, &delivery, "grace", Role::Organizer).await?;
    let event = organizer
        .create_event(NewEvent {
            title: "Rust Meetup".to_string(),
            description: "Lightning talks and pizza".to_string(),
            date: Utc::now() + Duration::days(7),
            location: "Berlin".to_string(),
            category: Some("Technology".to_string()),
            max_attendees: 2,
        })
        .await?;
    println!("   Created {} ({})\n", event.title, event.event_id);

    // Step 2: attendees register
    println!("2. Attendees register");
    let ada = sign_up_and_in(&app, &delivery, "ada", Role::Attendee).await?;
    let ada_receipt = ada.register(&event.event_id).await?;
    println!("   ada    -> ticket {}", ada_receipt.ticket_id);

    match ada.register(&event.event_id).await {
        Err(ServiceError::DuplicateRegistration { .. }) => println!("   ada    -> refused: already registered"),
        other => bail!("expected a duplicate registration, got {other:?}"),
    }

    let alan = sign_up_and_in(&app, &delivery, "alan", Role::Attendee).await?;
    let alan_receipt = alan.register(&event.event_id).await?;
    println!("   alan   -> ticket {}", alan_receipt.ticket_id);

    let barbara = sign_up_and_in(&app, &delivery, "barbara", Role::Attendee).await?;
    match barbara.register(&event.event_id).await {
        Err(ServiceError::EventFull(_)) => println!("   barbara -> refused: event full\n"),
        other => bail!("expected a full event, got {other:?}"),
    }

    // Step 3: organizer overview
    println!("3. Organizer overview");
    let overview = organizer.overview().await?;
    for summary in &overview.events {
        println!(
            "   {}: {}/{} registered ({}% full)",
            summary.event.title,
            summary.registration_count,
            summary.event.max_attendees,
            summary.event.fill_percentage()
        );
    }
    println!();

    // Step 4: door check
    println!("4. Door staff validate ada's ticket, typed in lower case");
    let typed = ada_receipt.ticket_id.as_str().to_lowercase();
    let validated = organizer.validate_ticket(&typed).await?;
    println!(
        "   {} is registered for {} ({})\n",
        validated.registration.attendee_name, validated.event.title, validated.timing
    );

    for portal in [organizer, ada, alan, barbara] {
        portal.sign_out().await?;
    }

    println!("============================================");
    println!("   Demo complete");
    println!("============================================\n");
    Ok(())
}

async fn sign_up_and_in(
    app: &EventRegApp,
    delivery: &RecordingCodeDelivery,
    handle: &str,
    role: Role,
) -> anyhow::Result<PortalSession> {
    let username = app
        .sign_up(SignUpRequest {
            email: format!("{handle}@example.com"),
            password: PASSWORD.to_string(),
            name: handle.to_string(),
            phone_number: "+15551234567".to_string(),
            preferred_username: handle.to_string(),
            role,
        })
        .await?;
    let code = delivery
        .last_code(&username)
        .context("confirmation code was not delivered")?;
    app.confirm_sign_up(&username, &code).await?;

    match app.sign_in(role, handle, PASSWORD).await? {
        SignInOutcome::SignedIn(portal) => Ok(portal),
        SignInOutcome::ConfirmationRequired { username } => bail!("{username} is still unconfirmed"),
    }
}
