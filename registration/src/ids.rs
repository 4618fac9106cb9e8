//! Identifier minting and ticket normalization.
//!
//! Every identifier is `<prefix>_<unix-millis>_<random base36>`. Tickets use
//! an upper-case random part so they can be read out and typed back in.

use crate::types::{EventId, RegistrationId, TicketId};
use eventreg_core::environment::{Clock, IdGenerator};
use std::sync::Arc;

/// Length of the random part of event and registration ids.
pub const ID_SUFFIX_LEN: usize = 9;

/// Length of the random part of ticket ids (41+ bits of entropy).
pub const TICKET_SUFFIX_LEN: usize = 8;

/// Mints identifiers from an injected clock and random source.
#[derive(Clone)]
pub struct IdMinter {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl IdMinter {
    /// Create a minter.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    fn mint(&self, prefix: &str, len: usize) -> String {
        let millis = self.clock.now().timestamp_millis();
        format!("{prefix}_{millis}_{}", self.ids.random_token(len))
    }

    /// New event id.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        EventId::new(self.mint("event", ID_SUFFIX_LEN))
    }

    /// New registration id.
    #[must_use]
    pub fn registration_id(&self) -> RegistrationId {
        RegistrationId::new(self.mint("reg", ID_SUFFIX_LEN))
    }

    /// New ticket id.
    #[must_use]
    pub fn ticket_id(&self) -> TicketId {
        TicketId::new(self.mint("TICKET", TICKET_SUFFIX_LEN).to_uppercase())
    }
}

/// Normalize user-entered ticket text: trimmed and upper-cased.
///
/// Returns `None` when nothing is left after trimming.
#[must_use]
pub fn normalize_ticket_input(input: &str) -> Option<TicketId> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| TicketId::new(trimmed.to_uppercase()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use eventreg_core::environment::Clock;
    use eventreg_testing::{SequentialIdGenerator, test_clock};
    use proptest::prelude::*;

    fn minter() -> IdMinter {
        IdMinter::new(Arc::new(test_clock()), Arc::new(SequentialIdGenerator::new()))
    }

    #[test]
    fn ids_carry_prefix_timestamp_and_suffix() {
        let minter = minter();
        let millis = test_clock().now().timestamp_millis();

        assert_eq!(minter.event_id().as_str(), format!("event_{millis}_000000001"));
        assert_eq!(minter.registration_id().as_str(), format!("reg_{millis}_000000002"));
        assert_eq!(minter.ticket_id().as_str(), format!("TICKET_{millis}_00000003"));
    }

    #[test]
    fn ticket_ids_are_upper_case() {
        let minter = IdMinter::new(
            Arc::new(test_clock()),
            Arc::new(eventreg_core::environment::RandomIdGenerator),
        );
        let ticket = minter.ticket_id();
        let suffix = ticket.as_str().rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), TICKET_SUFFIX_LEN);
        assert_eq!(ticket.as_str(), ticket.as_str().to_uppercase());
    }

    #[test]
    fn blank_ticket_input_is_rejected() {
        assert_eq!(normalize_ticket_input("   "), None);
        assert_eq!(normalize_ticket_input(""), None);
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent_and_case_insensitive(input in "[ ]{0,3}[a-zA-Z0-9_]{1,24}[ ]{0,3}") {
            let once = normalize_ticket_input(&input).unwrap();
            let twice = normalize_ticket_input(once.as_str()).unwrap();
            prop_assert_eq!(&once, &twice);

            let lower = normalize_ticket_input(&input.to_lowercase()).unwrap();
            prop_assert_eq!(once, lower);
        }
    }
}
