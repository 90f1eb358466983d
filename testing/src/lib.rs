//! # Larder Testing
//!
//! Testing utilities and helpers for the Larder reducer architecture.
//!
//! This crate provides:
//! - Deterministic clocks for the `Clock` environment trait
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Assertion helpers for the effects a reducer returns
//!
//! ## Example
//!
//! ```ignore
//! use larder_testing::{assertions, ReducerTest};
//!
//! ReducerTest::new(InventoryReducer::new())
//!     .with_env(test_environment())
//!     .given_state(InventoryState::default())
//!     .when_action(InventoryAction::AddItem { name: String::new(), quantity: 1 })
//!     .then_state(|state| assert!(state.feedback.is_some()))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use larder_core::environment::Clock;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use larder_testing::mocks::FixedClock;
    /// use larder_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
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
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
