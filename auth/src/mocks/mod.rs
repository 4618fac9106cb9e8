//! Mock provider implementations for testing.
//!
//! In-memory implementations of the provider traits for unit and
//! integration tests.

pub mod delivery;

pub use delivery::RecordingCodeDelivery;
