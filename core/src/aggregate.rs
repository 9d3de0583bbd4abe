//! Event aggregate: the reducer that decides every change to a single event.
//!
//! The reducer never performs I/O. Store backends load the current record into
//! an [`EventState`], run one [`EventAction`] through [`EventReducer`] and then
//! execute the returned effects, all while holding exclusive access to that
//! event. The ordering of checks inside each action is part of the contract:
//!
//! - RSVP: not found, then already registered, then full
//! - Update / Delete: not found, then forbidden, then validation

use crate::effect::Effect;
use crate::environment::Clock;
use crate::error::{EventError, Mutation};
use crate::event::{Event, EventDraft, EventPatch};
use crate::reducer::Reducer;
use crate::types::{Capacity, EventId, UserId};
use smallvec::{SmallVec, smallvec};
use std::sync::Arc;

// ============================================================================
// Actions
// ============================================================================

/// Requests that can change an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventAction {
    /// Create a new event owned by `owner`
    Create {
        /// Identifier assigned by the caller
        id: EventId,
        /// Creating user
        owner: UserId,
        /// Submitted fields
        draft: EventDraft,
    },

    /// Overwrite the provided fields of an event
    Update {
        /// Acting user
        actor: UserId,
        /// Fields to change
        patch: EventPatch,
    },

    /// Remove an event
    Delete {
        /// Acting user
        actor: UserId,
    },

    /// Register the acting user as an attendee
    Rsvp {
        /// Acting user
        actor: UserId,
    },
}

impl EventAction {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Rsvp { .. } => "rsvp",
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// The event being operated on, plus the outcome of the last action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventState {
    /// Current record, `None` if it does not exist (or was just deleted)
    pub event: Option<Event>,
    /// Rejection reason of the last action, `None` if it succeeded
    pub last_error: Option<EventError>,
}

impl EventState {
    /// State for an event that does not exist yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            event: None,
            last_error: None,
        }
    }

    /// State loaded from a stored record.
    #[must_use]
    pub const fn loaded(event: Option<Event>) -> Self {
        Self {
            event,
            last_error: None,
        }
    }

    /// Convert into the outcome of the last action.
    ///
    /// # Errors
    ///
    /// Returns the recorded rejection if the last action failed.
    pub fn into_result(self) -> Result<Option<Event>, EventError> {
        match self.last_error {
            Some(error) => Err(error),
            None => Ok(self.event),
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the event reducer.
#[derive(Clone)]
pub struct EventEnvironment {
    /// Source of `created_at` / `updated_at`
    pub clock: Arc<dyn Clock>,
}

impl EventEnvironment {
    /// Creates a new `EventEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl std::fmt::Debug for EventEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEnvironment").finish_non_exhaustive()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the event aggregate.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventReducer;

impl EventReducer {
    /// Creates a new `EventReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn validate_draft(state: &EventState, draft: &EventDraft) -> Result<Capacity, EventError> {
        if state.event.is_some() {
            return Err(EventError::validation("Event already exists"));
        }

        let blank = |value: &str| value.trim().is_empty();
        if blank(&draft.title) || blank(&draft.description) || blank(&draft.location) {
            return Err(EventError::validation("Please provide all required fields"));
        }

        Capacity::new(draft.max_attendees)
    }

    fn owned_event<'a>(
        state: &'a EventState,
        actor: UserId,
        mutation: Mutation,
    ) -> Result<&'a Event, EventError> {
        let event = state.event.as_ref().ok_or(EventError::NotFound)?;
        if !event.is_owned_by(actor) {
            return Err(EventError::Forbidden(mutation));
        }
        Ok(event)
    }

    fn validate_patch(event: &Event, patch: &EventPatch) -> Result<Option<Capacity>, EventError> {
        let Some(seats) = patch.max_attendees else {
            return Ok(None);
        };

        let capacity = Capacity::new(seats)?;
        if !capacity.admits(event.attendees.len()) {
            return Err(EventError::validation(format!(
                "maxAttendees cannot be lower than the current number of attendees ({})",
                event.attendees.len()
            )));
        }
        Ok(Some(capacity))
    }

    fn validate_rsvp(state: &EventState, actor: UserId) -> Result<(), EventError> {
        let event = state.event.as_ref().ok_or(EventError::NotFound)?;
        if event.has_attendee(actor) {
            return Err(EventError::AlreadyRegistered);
        }
        if event.is_full() {
            return Err(EventError::Full);
        }
        Ok(())
    }

    fn reject(state: &mut EventState, error: EventError) -> SmallVec<[Effect; 4]> {
        state.last_error = Some(error);
        SmallVec::new()
    }

    fn apply_patch(event: &mut Event, patch: EventPatch, capacity: Option<Capacity>) {
        if let Some(title) = patch.title {
            event.title = title;
        }
        if let Some(description) = patch.description {
            event.description = description;
        }
        if let Some(date) = patch.date {
            event.date = date;
        }
        if let Some(location) = patch.location {
            event.location = location;
        }
        if let Some(capacity) = capacity {
            event.max_attendees = capacity;
        }
        if let Some(image_url) = patch.image_url {
            event.image_url = Some(image_url);
        }
    }
}

impl Reducer for EventReducer {
    type State = EventState;
    type Action = EventAction;
    type Environment = EventEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect; 4]> {
        state.last_error = None;

        match action {
            EventAction::Create { id, owner, draft } => {
                let capacity = match Self::validate_draft(state, &draft) {
                    Ok(capacity) => capacity,
                    Err(error) => return Self::reject(state, error),
                };

                let now = env.clock.now();
                let event = Event {
                    id,
                    title: draft.title,
                    description: draft.description,
                    date: draft.date,
                    location: draft.location,
                    max_attendees: capacity,
                    image_url: draft.image_url,
                    created_by: owner,
                    attendees: Vec::new(),
                    created_at: now,
                    updated_at: now,
                };
                state.event = Some(event.clone());

                smallvec![Effect::save(event)]
            }

            EventAction::Update { actor, patch } => {
                let capacity = match Self::owned_event(state, actor, Mutation::Edit)
                    .and_then(|event| Self::validate_patch(event, &patch))
                {
                    Ok(capacity) => capacity,
                    Err(error) => return Self::reject(state, error),
                };

                let Some(event) = state.event.as_mut() else {
                    return Self::reject(state, EventError::NotFound);
                };
                Self::apply_patch(event, patch, capacity);
                event.updated_at = env.clock.now();

                smallvec![Effect::save(event.clone())]
            }

            EventAction::Delete { actor } => {
                let id = match Self::owned_event(state, actor, Mutation::Delete) {
                    Ok(event) => event.id,
                    Err(error) => return Self::reject(state, error),
                };
                state.event = None;

                smallvec![Effect::remove(id)]
            }

            EventAction::Rsvp { actor } => {
                if let Err(error) = Self::validate_rsvp(state, actor) {
                    return Self::reject(state, error);
                }

                let Some(event) = state.event.as_mut() else {
                    return Self::reject(state, EventError::NotFound);
                };
                event.attendees.push(actor);
                event.updated_at = env.clock.now();

                smallvec![Effect::save(event.clone())]
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::effect::StoreOperation;
    use crate::environment::SystemClock;
    use chrono::Utc;

    fn env() -> EventEnvironment {
        EventEnvironment::new(Arc::new(SystemClock))
    }

    fn draft(max_attendees: u32) -> EventDraft {
        EventDraft {
            title: "Launch party".to_string(),
            description: "Cake".to_string(),
            date: Utc::now(),
            location: "Lisbon".to_string(),
            max_attendees,
            image_url: Some("/uploads/cake.png".to_string()),
        }
    }

    fn created(owner: UserId, max_attendees: u32) -> EventState {
        let mut state = EventState::new();
        EventReducer.reduce(
            &mut state,
            EventAction::Create {
                id: EventId::new(),
                owner,
                draft: draft(max_attendees),
            },
            &env(),
        );
        assert!(state.last_error.is_none());
        state
    }

    #[test]
    fn create_saves_event_with_empty_attendees() {
        let owner = UserId::new();
        let id = EventId::new();
        let mut state = EventState::new();

        let effects = EventReducer.reduce(
            &mut state,
            EventAction::Create {
                id,
                owner,
                draft: draft(3),
            },
            &env(),
        );

        let event = state.event.as_ref().unwrap();
        assert_eq!(event.id, id);
        assert_eq!(event.created_by, owner);
        assert!(event.attendees.is_empty());
        assert_eq!(effects.as_slice(), &[Effect::save(event.clone())]);
    }

    #[test]
    fn create_rejects_blank_fields_and_zero_capacity() {
        let mut blank = draft(3);
        blank.location = "   ".to_string();
        let mut state = EventState::new();
        let effects = EventReducer.reduce(
            &mut state,
            EventAction::Create {
                id: EventId::new(),
                owner: UserId::new(),
                draft: blank,
            },
            &env(),
        );
        assert!(effects.is_empty());
        assert!(matches!(state.last_error, Some(EventError::Validation(_))));

        let mut state = EventState::new();
        EventReducer.reduce(
            &mut state,
            EventAction::Create {
                id: EventId::new(),
                owner: UserId::new(),
                draft: draft(0),
            },
            &env(),
        );
        assert!(matches!(state.last_error, Some(EventError::Validation(_))));
        assert!(state.event.is_none());
    }

    #[test]
    fn rsvp_check_order_is_not_found_then_duplicate_then_full() {
        let bob = UserId::new();

        let mut missing = EventState::new();
        EventReducer.reduce(&mut missing, EventAction::Rsvp { actor: bob }, &env());
        assert_eq!(missing.last_error, Some(EventError::NotFound));

        // bob holds the only seat: a repeat RSVP reports the duplicate, not the full event
        let mut state = created(UserId::new(), 1);
        EventReducer.reduce(&mut state, EventAction::Rsvp { actor: bob }, &env());
        assert!(state.last_error.is_none());
        EventReducer.reduce(&mut state, EventAction::Rsvp { actor: bob }, &env());
        assert_eq!(state.last_error, Some(EventError::AlreadyRegistered));

        let effects =
            EventReducer.reduce(&mut state, EventAction::Rsvp { actor: UserId::new() }, &env());
        assert_eq!(state.last_error, Some(EventError::Full));
        assert!(effects.is_empty());
        assert_eq!(state.event.unwrap().attendees, vec![bob]);
    }

    #[test]
    fn update_by_stranger_is_forbidden_and_leaves_event_unchanged() {
        let mut state = created(UserId::new(), 2);
        let before = state.event.clone();

        let effects = EventReducer.reduce(
            &mut state,
            EventAction::Update {
                actor: UserId::new(),
                patch: EventPatch {
                    title: Some("Hijacked".to_string()),
                    ..EventPatch::default()
                },
            },
            &env(),
        );

        assert!(effects.is_empty());
        assert_eq!(state.last_error, Some(EventError::Forbidden(Mutation::Edit)));
        assert_eq!(state.event, before);
    }

    #[test]
    fn update_overwrites_only_provided_fields() {
        let owner = UserId::new();
        let mut state = created(owner, 2);
        let before = state.event.clone().unwrap();

        EventReducer.reduce(
            &mut state,
            EventAction::Update {
                actor: owner,
                patch: EventPatch {
                    description: Some(String::new()),
                    max_attendees: Some(5),
                    ..EventPatch::default()
                },
            },
            &env(),
        );

        let after = state.event.unwrap();
        assert_eq!(after.title, before.title);
        assert_eq!(after.description, "");
        assert_eq!(after.max_attendees.get(), 5);
        assert_eq!(after.image_url, before.image_url);
    }

    #[test]
    fn update_cannot_drop_capacity_below_attendee_count() {
        let owner = UserId::new();
        let mut state = created(owner, 3);
        for _ in 0..2 {
            EventReducer.reduce(&mut state, EventAction::Rsvp { actor: UserId::new() }, &env());
        }

        let effects = EventReducer.reduce(
            &mut state,
            EventAction::Update {
                actor: owner,
                patch: EventPatch {
                    max_attendees: Some(1),
                    ..EventPatch::default()
                },
            },
            &env(),
        );

        assert!(effects.is_empty());
        assert!(matches!(state.last_error, Some(EventError::Validation(_))));
        assert_eq!(state.event.as_ref().unwrap().max_attendees.get(), 3);

        // lowering to exactly the attendee count is allowed
        EventReducer.reduce(
            &mut state,
            EventAction::Update {
                actor: owner,
                patch: EventPatch {
                    max_attendees: Some(2),
                    ..EventPatch::default()
                },
            },
            &env(),
        );
        assert!(state.last_error.is_none());
        assert!(state.event.unwrap().is_full());
    }

    #[test]
    fn delete_by_owner_removes_event() {
        let owner = UserId::new();
        let mut state = created(owner, 2);
        let id = state.event.as_ref().unwrap().id;

        let forbidden =
            EventReducer.reduce(&mut state, EventAction::Delete { actor: UserId::new() }, &env());
        assert!(forbidden.is_empty());
        assert_eq!(state.last_error, Some(EventError::Forbidden(Mutation::Delete)));
        assert!(state.event.is_some());

        let effects = EventReducer.reduce(&mut state, EventAction::Delete { actor: owner }, &env());
        assert!(state.event.is_none());
        assert_eq!(
            effects.into_iter().flat_map(Effect::into_operations).collect::<Vec<_>>(),
            vec![StoreOperation::Remove(id)]
        );
    }
}
