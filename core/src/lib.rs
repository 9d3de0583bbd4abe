//! # Evently Core
//!
//! Domain types and pure business logic for the Evently event-management service.
//!
//! This crate holds the "functional core": every decision about an event
//! (creation, ownership-gated edits and deletes, capacity-bounded RSVPs) is made
//! by a reducer that mutates in-memory state and returns *descriptions* of the
//! persistence work to perform. Storage backends execute those descriptions.
//!
//! ## Core Concepts
//!
//! - **State**: [`aggregate::EventState`], the current event (if any) plus the last rejection
//! - **Action**: [`aggregate::EventAction`], every request that can change an event
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: [`effect::Effect`], a persistence operation to be executed by the shell
//! - **Environment**: Injected dependencies ([`environment::Clock`])
//!
//! ## Atomicity
//!
//! A store backend must run the reducer *and* execute its effects while holding
//! exclusive access to the event being changed. Doing so turns the RSVP
//! membership check, capacity check and append into one serialized step.
//!
//! ## Example
//!
//! ```
//! use evently_core::aggregate::{EventAction, EventEnvironment, EventReducer, EventState};
//! use evently_core::environment::SystemClock;
//! use evently_core::event::EventDraft;
//! use evently_core::reducer::Reducer;
//! use evently_core::types::{EventId, UserId};
//! use std::sync::Arc;
//!
//! let env = EventEnvironment::new(Arc::new(SystemClock));
//! let mut state = EventState::new();
//! let draft = EventDraft {
//!     title: "Rust meetup".to_string(),
//!     description: "Talks and pizza".to_string(),
//!     date: chrono::Utc::now(),
//!     location: "Berlin".to_string(),
//!     max_attendees: 2,
//!     image_url: None,
//! };
//!
//! let effects = EventReducer.reduce(
//!     &mut state,
//!     EventAction::Create { id: EventId::new(), owner: UserId::new(), draft },
//!     &env,
//! );
//!
//! assert_eq!(effects.len(), 1);
//! assert!(state.last_error.is_none());
//! ```

pub mod aggregate;
pub mod error;
pub mod event;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Most actions yield zero or one effect, so the inline capacity of
        /// the returned `SmallVec` avoids a heap allocation.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are NOT executed by the reducer. They are values describing what
/// should happen, returned from reducers and executed by a store backend.
pub mod effect {
    use crate::event::Event;
    use crate::types::EventId;

    /// A persistence operation against the event store.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum StoreOperation {
        /// Insert or replace the full event record
        Save(Box<Event>),
        /// Remove the event record permanently
        Remove(EventId),
    }

    /// Effect type - describes a side effect to be executed
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Effect {
        /// No-op effect
        None,

        /// Run effects sequentially, in order
        Sequential(Vec<Effect>),

        /// Persist a change to the event store
        Store(StoreOperation),
    }

    impl Effect {
        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect>) -> Effect {
            Effect::Sequential(effects)
        }

        /// Shorthand for `Effect::Store(StoreOperation::Save(..))`
        #[must_use]
        pub fn save(event: Event) -> Effect {
            Effect::Store(StoreOperation::Save(Box::new(event)))
        }

        /// Shorthand for `Effect::Store(StoreOperation::Remove(..))`
        #[must_use]
        pub const fn remove(id: EventId) -> Effect {
            Effect::Store(StoreOperation::Remove(id))
        }

        /// Flatten this effect into the store operations it describes, in execution order.
        #[must_use]
        pub fn into_operations(self) -> Vec<StoreOperation> {
            let mut operations = Vec::new();
            self.collect_into(&mut operations);
            operations
        }

        fn collect_into(self, operations: &mut Vec<StoreOperation>) {
            match self {
                Effect::None => {}
                Effect::Sequential(effects) => {
                    for effect in effects {
                        effect.collect_into(operations);
                    }
                }
                Effect::Store(operation) => operations.push(operation),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use evently_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = chrono::Utc::now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::{Effect, StoreOperation};
    use super::types::EventId;

    #[test]
    fn sequential_effects_flatten_in_order() {
        let first = EventId::new();
        let second = EventId::new();

        let effect = Effect::chain(vec![
            Effect::remove(first),
            Effect::None,
            Effect::chain(vec![Effect::remove(second)]),
        ]);

        assert_eq!(
            effect.into_operations(),
            vec![StoreOperation::Remove(first), StoreOperation::Remove(second)]
        );
    }

    #[test]
    fn none_has_no_operations() {
        assert!(Effect::None.into_operations().is_empty());
    }
}
