//! # Evently Testing
//!
//! Testing utilities and helpers for the Evently service.
//!
//! This crate provides:
//! - Deterministic clocks for reducer and credential tests
//! - The Given/When/Then [`ReducerTest`] harness
//! - Fixtures for common event inputs
//!
//! ## Example
//!
//! ```
//! use evently_testing::{fixtures, test_clock, ReducerTest};
//! use evently_core::aggregate::{EventAction, EventReducer, EventState};
//! use evently_core::types::{EventId, UserId};
//!
//! ReducerTest::new(EventReducer)
//!     .with_env(fixtures::environment(test_clock()))
//!     .given_state(EventState::new())
//!     .when_action(EventAction::Create {
//!         id: EventId::new(),
//!         owner: UserId::new(),
//!         draft: fixtures::draft(2),
//!     })
//!     .then_state(|state| assert!(state.event.is_some()))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use evently_core::environment::Clock;


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
    /// use evently_testing::mocks::FixedClock;
    /// use evently_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// A clock fixed `duration` later than this one
        #[must_use]
        pub fn advanced_by(&self, duration: chrono::Duration) -> Self {
            Self::new(self.time + duration)
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
}

/// Ready-made inputs for event tests.
pub mod fixtures {
    use super::mocks::FixedClock;
    use chrono::{Duration, Utc};
    use evently_core::aggregate::EventEnvironment;
    use evently_core::event::EventDraft;
    use std::sync::Arc;

    /// Environment backed by the given clock.
    #[must_use]
    pub fn environment(clock: FixedClock) -> EventEnvironment {
        EventEnvironment::new(Arc::new(clock))
    }

    /// A valid draft a week after the current time, with `max_attendees` seats.
    #[must_use]
    pub fn draft(max_attendees: u32) -> EventDraft {
        draft_titled("Rust Meetup", max_attendees)
    }

    /// A valid draft with a custom title.
    #[must_use]
    pub fn draft_titled(title: &str, max_attendees: u32) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            description: "Lightning talks and pizza".to_string(),
            date: Utc::now() + Duration::days(7),
            location: "Community Hall".to_string(),
            max_attendees,
            image_url: None,
        }
    }
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evently=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
