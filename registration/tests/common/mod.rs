//! Shared fixtures for the registration integration tests.

#![allow(dead_code)]
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use chrono::Duration;
use eventreg_auth::mocks::RecordingCodeDelivery;
use eventreg_auth::providers::LocalIdentityProvider;
use eventreg_auth::{Role, SignUpRequest};
use eventreg_core::environment::Clock;
use eventreg_testing::{InMemoryDataStore, ManualClock, SequentialIdGenerator, test_clock};
use registration::{Config, Event, EventRegApp, NewEvent, PortalSession, SignInOutcome};
use std::sync::Arc;

pub const PASSWORD: &str = "password123";

/// An application over the in-memory store with a controllable clock.
pub struct Harness {
    pub app: EventRegApp,
    pub identity: Arc<LocalIdentityProvider>,
    pub store: InMemoryDataStore,
    pub delivery: RecordingCodeDelivery,
    pub clock: ManualClock,
}

pub fn harness() -> Harness {
    harness_with(Config::default())
}

pub fn harness_with(config: Config) -> Harness {
    let store = InMemoryDataStore::new();
    let delivery = RecordingCodeDelivery::new();
    let clock = ManualClock::new(test_clock().now());
    let ids = Arc::new(SequentialIdGenerator::new());
    let identity = Arc::new(LocalIdentityProvider::new(
        Arc::new(store.clone()),
        Arc::new(delivery.clone()),
        Arc::new(clock.clone()),
        ids.clone(),
        config.auth.identity_config(),
    ));
    let app = EventRegApp::with_identity(
        config,
        Arc::new(store.clone()),
        identity.clone(),
        Arc::new(clock.clone()),
        ids,
    );
    Harness {
        app,
        identity,
        store,
        delivery,
        clock,
    }
}

pub fn sign_up_request(handle: &str, role: Role) -> SignUpRequest {
    SignUpRequest {
        email: format!("{handle}@example.com"),
        password: PASSWORD.to_string(),
        name: format!("{handle} tester"),
        phone_number: "+15551234567".to_string(),
        preferred_username: handle.to_string(),
        role,
    }
}

impl Harness {
    /// Sign up and confirm an account; returns the generated username.
    pub async fn confirmed_user(&self, handle: &str, role: Role) -> String {
        let username = self.app.sign_up(sign_up_request(handle, role)).await.unwrap();
        let code = self.delivery.last_code(&username).expect("code should be delivered");
        self.app.confirm_sign_up(&username, &code).await.unwrap();
        username
    }

    /// Sign a confirmed account in to the portal for `role`.
    pub async fn sign_in(&self, handle: &str, role: Role) -> PortalSession {
        match self.app.sign_in(role, handle, PASSWORD).await.unwrap() {
            SignInOutcome::SignedIn(portal) => portal,
            SignInOutcome::ConfirmationRequired { username } => panic!("{username} is unconfirmed"),
        }
    }

    /// Sign up, confirm and sign in.
    pub async fn portal(&self, handle: &str, role: Role) -> PortalSession {
        self.confirmed_user(handle, role).await;
        self.sign_in(handle, role).await
    }

    /// Create an event `days` days after the harness clock.
    pub async fn event(&self, organizer: &PortalSession, title: &str, days: i64, max_attendees: u32) -> Event {
        organizer
            .create_event(new_event(title, &self.clock, days, max_attendees))
            .await
            .unwrap()
    }
}

pub fn new_event(title: &str, clock: &ManualClock, days: i64, max_attendees: u32) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        description: format!("{title} description"),
        date: clock.now() + Duration::days(days),
        location: "Berlin".to_string(),
        category: None,
        max_attendees,
    }
}
