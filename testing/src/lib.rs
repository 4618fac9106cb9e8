//! # Eventreg Testing
//!
//! In-memory backends and deterministic environment doubles for the event
//! registration system.
//!
//! This crate provides:
//! - [`InMemoryDataStore`]: a `HashMap` implementation of `DataStore`
//! - Mock implementations of Environment traits ([`FixedClock`],
//!   [`ManualClock`], [`SequentialIdGenerator`])
//!
//! ## Example
//!
//! ```ignore
//! use eventreg_testing::{InMemoryDataStore, SequentialIdGenerator, test_clock};
//!
//! #[tokio::test]
//! async fn registers_once() {
//!     let store = Arc::new(InMemoryDataStore::new());
//!     let service = RegistrationService::new(store, Arc::new(test_clock()), Arc::new(SequentialIdGenerator::new()));
//!     // ...
//! }
//! ```

pub mod in_memory_store;

pub use in_memory_store::InMemoryDataStore;

use chrono::{DateTime, Utc};
use eventreg_core::environment::{BASE36_ALPHABET, Clock, IdGenerator};

/// Mock implementations for testing.
pub mod mocks {
    use super::{BASE36_ALPHABET, Clock, DateTime, IdGenerator, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use eventreg_testing::mocks::FixedClock;
    /// use eventreg_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Clock that only moves when told to.
    ///
    /// Clones share the same time, so a test can keep a handle while the
    /// code under test holds another.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Start the clock at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.write().unwrap_or_else(std::sync::PoisonError::into_inner);
            *time += by;
        }

        /// Jump to an absolute time.
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.write().unwrap_or_else(std::sync::PoisonError::into_inner) = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.read().unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }

    /// Predictable token source: the n-th call yields `n` in base36,
    /// zero-padded (or truncated from the left) to the requested length.
    #[derive(Debug, Default)]
    pub struct SequentialIdGenerator {
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Start counting at 1.
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn random_token(&self, len: usize) -> String {
            let mut n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            let mut digits = Vec::with_capacity(len);
            for _ in 0..len {
                #[allow(clippy::cast_possible_truncation)] // n % 36 < 36
                digits.push(BASE36_ALPHABET[(n % 36) as usize]);
                n /= 36;
            }
            digits.reverse();
            digits.into_iter().map(char::from).collect()
        }
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, SequentialIdGenerator, test_clock};
