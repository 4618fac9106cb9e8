//! Business metrics for the registration service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `eventreg_registrations_total{outcome}` - Registration attempts by outcome
//!   (confirmed, duplicate, full, rejected)
//! - `eventreg_events_created_total` - Events created
//! - `eventreg_ticket_validations_total{outcome}` - Ticket lookups by outcome
//!   (valid, not_found, orphaned, conflict)
//! - `eventreg_sign_ins_total{outcome}` - Portal sign-ins by outcome
//!   (signed_in, confirmation_required, wrong_portal, failed)

use metrics::describe_counter;

/// Initialize and register all business metrics descriptions.
///
/// Call once at startup, before any metric is recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "eventreg_registrations_total",
        "Registration attempts by outcome (confirmed, duplicate, full, rejected)"
    );
    describe_counter!("eventreg_events_created_total", "Total number of events created");
    describe_counter!(
        "eventreg_ticket_validations_total",
        "Ticket validations by outcome (valid, not_found, orphaned, conflict)"
    );
    describe_counter!(
        "eventreg_sign_ins_total",
        "Portal sign-ins by outcome (signed_in, confirmation_required, wrong_portal, failed)"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record the outcome of a registration attempt.
pub fn record_registration(outcome: &'static str) {
    metrics::counter!("eventreg_registrations_total", "outcome" => outcome).increment(1);
}

/// Record a created event.
pub fn record_event_created() {
    metrics::counter!("eventreg_events_created_total").increment(1);
}

/// Record the outcome of a ticket validation.
pub fn record_ticket_validation(outcome: &'static str) {
    metrics::counter!("eventreg_ticket_validations_total", "outcome" => outcome).increment(1);
}

/// Record the outcome of a portal sign-in.
pub fn record_sign_in(outcome: &'static str) {
    metrics::counter!("eventreg_sign_ins_total", "outcome" => outcome).increment(1);
}
