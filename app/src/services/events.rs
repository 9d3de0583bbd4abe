//! The event service.
//!
//! Reads go straight to the [`EventStore`]; every change is an
//! [`EventAction`] sent through [`EventStore::send`] so that the reducer
//! decides it under the store's per-event lock. Listings resolve user ids to
//! public profiles through the auth service.

use crate::store::EventStore;
use chrono::{DateTime, Utc};
use evently_auth::{AuthService, UserProfile, UserRepository};
use evently_core::aggregate::{EventAction, EventState};
use evently_core::error::{EventError, Result};
use evently_core::event::{Event, EventDraft, EventPatch};
use evently_core::query::{EventFilter, sort_chronologically};
use evently_core::types::{EventId, UserId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};

// ============================================================================
// Projections
// ============================================================================

/// The owner of an event as shown to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OwnerRef {
    /// Resolved public profile
    Profile(UserProfile),
    /// Bare id, when the profile is not resolved or the user no longer exists
    Id(UserId),
}

impl OwnerRef {
    /// Id of the owner.
    #[must_use]
    pub const fn id(&self) -> UserId {
        match self {
            Self::Profile(profile) => profile.id,
            Self::Id(id) => *id,
        }
    }
}

/// An attendee as shown to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttendeeView {
    /// User id
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name
    pub username: String,
    /// Email, only in the owner's own listing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// An event with its user references resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    /// Event id
    #[serde(rename = "_id")]
    pub id: EventId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Location
    pub location: String,
    /// Capacity
    pub max_attendees: u32,
    /// Public image path
    pub image_url: Option<String>,
    /// Owner
    pub created_by: OwnerRef,
    /// Attendees in RSVP order
    pub attendees: Vec<AttendeeView>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// How much of each user reference to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Projection {
    /// Owner as `{_id, username, email}`, attendees as `{_id, username}`
    Public,
    /// Owner as a bare id, attendees as `{_id, username, email}`
    Owned,
}

impl EventView {
    fn project(event: Event, profiles: &HashMap<UserId, UserProfile>, projection: Projection) -> Self {
        let created_by = match projection {
            Projection::Public => profiles
                .get(&event.created_by)
                .cloned()
                .map_or(OwnerRef::Id(event.created_by), OwnerRef::Profile),
            Projection::Owned => OwnerRef::Id(event.created_by),
        };

        let attendees = event
            .attendees
            .iter()
            .filter_map(|id| profiles.get(id))
            .map(|profile| AttendeeView {
                id: profile.id,
                username: profile.username.clone(),
                email: (projection == Projection::Owned).then(|| profile.email.clone()),
            })
            .collect();

        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.date,
            location: event.location,
            max_attendees: event.max_attendees.get(),
            image_url: event.image_url,
            created_by,
            attendees,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// Create, read, change and RSVP to events.
#[derive(Clone, Debug)]
pub struct EventService<S, R> {
    store: S,
    auth: AuthService<R>,
}

impl<S: EventStore, R: UserRepository> EventService<S, R> {
    /// Create a new event service.
    #[must_use]
    pub const fn new(store: S, auth: AuthService<R>) -> Self {
        Self { store, auth }
    }

    /// The underlying event store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create an event owned by `owner`.
    ///
    /// # Errors
    ///
    /// [`EventError::Validation`] for blank fields or a non-positive capacity.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, owner: UserId, draft: EventDraft) -> Result<Event> {
        let id = EventId::new();
        let event = self
            .dispatch(id, EventAction::Create { id, owner, draft })
            .await?
            .ok_or_else(|| EventError::internal("created event missing from state"))?;

        info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    /// Every event matching `filter`, soonest first, with owner and attendee profiles.
    ///
    /// # Errors
    ///
    /// [`EventError::Internal`] if a store fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self, filter: EventFilter) -> Result<Vec<EventView>> {
        let mut events = self.store.list(&filter.normalized()).await?;
        sort_chronologically(&mut events);
        self.project(events, Projection::Public).await
    }

    /// Events created by `owner`, soonest first, with attendee emails.
    ///
    /// # Errors
    ///
    /// [`EventError::Internal`] if a store fails.
    #[instrument(skip(self))]
    pub async fn list_owned(&self, owner: UserId) -> Result<Vec<EventView>> {
        let mut events = self.store.list_by_owner(owner).await?;
        sort_chronologically(&mut events);
        self.project(events, Projection::Owned).await
    }

    /// One event with owner and attendee profiles.
    ///
    /// # Errors
    ///
    /// [`EventError::NotFound`] if no such event exists.
    #[instrument(skip(self))]
    pub async fn get(&self, id: EventId) -> Result<EventView> {
        let event = self.store.get(id).await?.ok_or(EventError::NotFound)?;
        let mut views = self.project(vec![event], Projection::Public).await?;
        views.pop().ok_or(EventError::NotFound)
    }

    /// Overwrite the provided fields of an event owned by `actor`.
    ///
    /// # Errors
    ///
    /// [`EventError::NotFound`], then [`EventError::Forbidden`], then
    /// [`EventError::Validation`].
    #[instrument(skip(self, patch))]
    pub async fn update(&self, actor: UserId, id: EventId, patch: EventPatch) -> Result<Event> {
        let event = self
            .dispatch(id, EventAction::Update { actor, patch })
            .await?
            .ok_or(EventError::NotFound)?;

        info!(event_id = %id, "Event updated");
        Ok(event)
    }

    /// Permanently remove an event owned by `actor`.
    ///
    /// # Errors
    ///
    /// [`EventError::NotFound`], then [`EventError::Forbidden`].
    #[instrument(skip(self))]
    pub async fn delete(&self, actor: UserId, id: EventId) -> Result<()> {
        self.dispatch(id, EventAction::Delete { actor }).await?;

        info!(event_id = %id, "Event deleted");
        Ok(())
    }

    /// Add `actor` to the attendee list.
    ///
    /// The membership check, the capacity check and the append happen under
    /// the store's lock for this event.
    ///
    /// # Errors
    ///
    /// [`EventError::NotFound`], then [`EventError::AlreadyRegistered`], then
    /// [`EventError::Full`].
    #[instrument(skip(self))]
    pub async fn rsvp(&self, actor: UserId, id: EventId) -> Result<Event> {
        let event = self
            .dispatch(id, EventAction::Rsvp { actor })
            .await?
            .ok_or(EventError::NotFound)?;

        info!(
            event_id = %id,
            attendees = event.attendees.len(),
            capacity = event.max_attendees.get(),
            "RSVP accepted"
        );
        Ok(event)
    }

    /// Check the event store is reachable.
    ///
    /// # Errors
    ///
    /// [`EventError::Internal`] if it is not.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await.map_err(EventError::from)
    }

    async fn dispatch(&self, id: EventId, action: EventAction) -> Result<Option<Event>> {
        let action_name = action.name();
        let state: EventState = self.store.send(id, action).await?;

        if let Some(error) = &state.last_error {
            tracing::debug!(event_id = %id, action = action_name, %error, "Action rejected");
        }
        state.into_result()
    }

    async fn project(&self, events: Vec<Event>, projection: Projection) -> Result<Vec<EventView>> {
        let mut ids: Vec<UserId> = Vec::new();
        let mut seen = HashSet::new();
        for event in &events {
            let owner = (projection == Projection::Public).then_some(event.created_by);
            for id in owner.into_iter().chain(event.attendees.iter().copied()) {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
        }

        let profiles = self
            .auth
            .profiles(&ids)
            .await
            .map_err(|e| EventError::internal(e.detail()))?;

        Ok(events
            .into_iter()
            .map(|event| EventView::project(event, &profiles, projection))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryEventStore;
    use evently_auth::{InMemoryUserRepository, RegisterRequest, TokenIssuer};
    use evently_testing::fixtures::{draft, draft_titled, environment};
    use evently_testing::test_clock;
    use std::sync::Arc;

    type Service = EventService<InMemoryEventStore, InMemoryUserRepository>;

    fn service() -> Service {
        let clock = Arc::new(test_clock());
        let tokens = TokenIssuer::new(b"secret", "evently", chrono::Duration::days(30), clock.clone());
        let auth = AuthService::new(InMemoryUserRepository::new(), tokens, clock);
        EventService::new(InMemoryEventStore::new(environment(test_clock())), auth)
    }

    async fn user(service: &Service, name: &str) -> UserProfile {
        service
            .auth
            .register(RegisterRequest {
                username: name.to_string(),
                email: format!("{name}@x.com"),
                password: "secret1".to_string(),
            })
            .await
            .unwrap()
            .profile
    }

    #[tokio::test]
    async fn public_projection_resolves_owner_and_attendee_names() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;

        let event = service.create(alice.id, draft(2)).await.unwrap();
        service.rsvp(bob.id, event.id).await.unwrap();

        let view = service.get(event.id).await.unwrap();
        assert_eq!(view.created_by, OwnerRef::Profile(alice.clone()));
        assert_eq!(view.created_by.id(), alice.id);
        assert_eq!(
            view.attendees,
            vec![AttendeeView { id: bob.id, username: "bob".to_string(), email: None }]
        );
    }

    #[tokio::test]
    async fn owned_projection_includes_attendee_emails() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;

        let event = service.create(alice.id, draft(2)).await.unwrap();
        service.rsvp(bob.id, event.id).await.unwrap();

        let mine = service.list_owned(alice.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].created_by, OwnerRef::Id(alice.id));
        assert_eq!(mine[0].attendees[0].email.as_deref(), Some("bob@x.com"));

        assert!(service.list_owned(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_is_filtered_and_sorted() {
        let service = service();
        let alice = user(&service, "alice").await;

        let mut later = draft_titled("Rust Meetup", 5);
        later.date += chrono::Duration::days(3);
        service.create(alice.id, later).await.unwrap();
        service.create(alice.id, draft_titled("Go Meetup", 5)).await.unwrap();
        service.create(alice.id, draft_titled("Book Club", 5)).await.unwrap();

        let all = service.list_all(EventFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.last().unwrap().title, "Rust Meetup");

        let meetups = service
            .list_all(EventFilter { title: Some("meetup".to_string()), ..EventFilter::default() })
            .await
            .unwrap();
        let titles: Vec<_> = meetups.iter().map(|view| view.title.as_str()).collect();
        assert_eq!(titles, ["Go Meetup", "Rust Meetup"]);
    }

    #[tokio::test]
    async fn unknown_owner_falls_back_to_id() {
        let service = service();
        let ghost = UserId::new();
        let event = service.create(ghost, draft(1)).await.unwrap();

        let view = service.get(event.id).await.unwrap();
        assert_eq!(view.created_by, OwnerRef::Id(ghost));
    }

    #[tokio::test]
    async fn get_unknown_event_is_not_found() {
        assert_eq!(service().get(EventId::new()).await, Err(EventError::NotFound));
    }
}
