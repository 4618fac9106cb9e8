//! # Eventreg Core
//!
//! Core traits and types shared by every crate of the event registration system.
//!
//! This crate provides:
//!
//! - **Data store abstraction** ([`data_store`]): a small key-value/document
//!   contract (`put`, `get`, `update`, `scan`, `delete`) over three logical
//!   tables, with conditional writes and atomic counter increments
//! - **Environment** ([`environment`]): injected dependencies such as the
//!   clock and the random token source
//!
//! ## Architecture Principles
//!
//! - Services depend on traits, never on a concrete backend
//! - Every store call is asynchronous and returns an explicit `Result`
//! - Shared counters are only modified through atomic increments
//!
//! ## Example
//!
//! ```ignore
//! use eventreg_core::data_store::{DataStore, Filter, Table};
//!
//! async fn registrations_for(store: &dyn DataStore, event_id: &str) {
//!     let filter = Filter::new().equals("EventID", event_id);
//!     let items = store.scan(Table::Registrations, filter).await?;
//!     println!("{} registrations", items.len());
//! }
//! ```

pub mod data_store;

pub use data_store::{DataStore, Filter, Increment, Item, PutCondition, StoreError, Table, TableNames};

/// Environment traits for dependency injection
///
/// All external, non-deterministic dependencies are abstracted behind traits
/// so tests can substitute fixed implementations.
pub mod environment {
    use chrono::{DateTime, Utc};
    use rand::Rng;

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use eventreg_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let earlier = clock.now();
    /// assert!(clock.now() >= earlier);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Alphabet used for random tokens: digits and lowercase ASCII letters.
    pub const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    /// Source of the random component of generated identifiers.
    ///
    /// Tokens are lowercase base36; callers upper-case them where a
    /// human-presentable form is required.
    pub trait IdGenerator: Send + Sync {
        /// Produce a token of exactly `len` base36 characters.
        fn random_token(&self, len: usize) -> String;
    }

    /// Production generator drawing from the thread-local CSPRNG.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RandomIdGenerator;

    impl IdGenerator for RandomIdGenerator {
        fn random_token(&self, len: usize) -> String {
            let mut rng = rand::thread_rng();
            (0..len)
                .map(|_| char::from(BASE36_ALPHABET[rng.gen_range(0..BASE36_ALPHABET.len())]))
                .collect()
        }
    }
}
