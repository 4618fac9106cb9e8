//! Event registration service.
//!
//! Organizers publish events with a fixed number of seats; attendees browse the
//! catalog, register, and receive a ticket id that door staff validate.
//!
//! # Architecture
//!
//! ```text
//!   HTTP API (axum)          PortalSession (per signed-in user)
//!          │                          │
//!          └────────────┬─────────────┘
//!                       ▼
//!          ┌────────────────────────────┐
//!          │ Services                   │
//!          │  EventService              │
//!          │  RegistrationService       │
//!          │  TicketService             │
//!          └────────────────────────────┘
//!                       │ RecordStore (typed records)
//!                       ▼
//!          DataStore: in-memory or PostgreSQL
//! ```
//!
//! # Registration invariants
//!
//! - An attendee holds at most one registration per event. The store's
//!   unique-attribute put rejects the second one even under concurrency.
//! - An event's attendee counter never exceeds its capacity. The counter only
//!   moves through a ceiling-checked atomic increment; a registration whose
//!   increment is refused is deleted again.
//! - Ticket lookup ignores case and surrounding whitespace.
//!
//! # Usage
//!
//! ```ignore
//! let app = EventRegApp::new(Config::from_env()).await?;
//! let router = build_router(AppState::new(app));
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod portal;
pub mod refresh;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use app::EventRegApp;
pub use config::Config;
pub use error::{Result, ServiceError};
pub use metrics::register_business_metrics;
pub use portal::{Dashboard, PortalSession, SignInOutcome};
pub use server::{AppState, build_router};
pub use types::{
    Event, EventId, EventTiming, NewEvent, Registration, RegistrationId, RegistrationReceipt,
    RegistrationStatus, TicketId, ValidatedTicket,
};
