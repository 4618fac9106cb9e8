//! Domain services over the record store.
//!
//! - [`EventService`]: event creation, lookup, catalog search, organizer overview
//! - [`RegistrationService`]: duplicate-safe registration with a capacity-guarded counter
//! - [`TicketService`]: ticket lookup joined with its event
//!
//! Each service holds its dependencies behind `Arc`s and is cheap to clone.

pub mod events;
pub mod registrations;
pub mod tickets;

pub use events::EventService;
pub use registrations::RegistrationService;
pub use tickets::TicketService;

use crate::ids::IdMinter;
use crate::store::RecordStore;
use eventreg_core::DataStore;
use eventreg_core::environment::{Clock, IdGenerator};
use std::sync::Arc;

/// The three services sharing one store, clock and id source.
#[derive(Clone)]
pub struct Services {
    /// Event operations.
    pub events: EventService,
    /// Registration operations.
    pub registrations: RegistrationService,
    /// Ticket validation.
    pub tickets: TicketService,
}

impl Services {
    /// Wire the services over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        let records = RecordStore::new(store);
        let minter = IdMinter::new(Arc::clone(&clock), ids);
        Self {
            events: EventService::new(records.clone(), Arc::clone(&clock), minter.clone()),
            registrations: RegistrationService::new(records.clone(), Arc::clone(&clock), minter),
            tickets: TicketService::new(records, clock),
        }
    }
}
