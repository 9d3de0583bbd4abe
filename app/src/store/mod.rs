//! Event persistence.
//!
//! An [`EventStore`] owns the event records and is the only place the
//! [`EventReducer`](evently_core::aggregate::EventReducer) runs. Every change
//! goes through [`EventStore::send`], which loads the record, reduces the
//! action and executes the resulting effects as one step that no other
//! `send` for the same event can interleave with:
//!
//! - [`memory::InMemoryEventStore`] holds a `tokio::sync::Mutex` per event
//! - [`postgres::PostgresEventStore`] holds a `SELECT ... FOR UPDATE` row lock
//!   inside a transaction
//!
//! [`EventBackend`] and [`UserBackend`] pick an engine at startup.

use evently_core::aggregate::{EventAction, EventState};
use evently_core::error::EventError;
use evently_core::event::Event;
use evently_core::query::EventFilter;
use evently_core::types::{EventId, UserId};
use std::future::Future;
use thiserror::Error;

pub mod memory;
pub mod postgres;
pub mod users;

pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use users::UserBackend;

/// Infrastructure failures of an event store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Query or connection failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row violates an event invariant
    #[error("corrupt event record {id}: {reason}")]
    Corrupt {
        /// Offending record
        id: EventId,
        /// What was wrong with it
        reason: String,
    },
}

impl From<StoreError> for EventError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

/// Storage for events.
pub trait EventStore: Clone + Send + Sync + 'static {
    /// Fetch one event.
    fn get(&self, id: EventId) -> impl Future<Output = Result<Option<Event>, StoreError>> + Send;

    /// Every event matching `filter`, in no particular order.
    fn list(
        &self,
        filter: &EventFilter,
    ) -> impl Future<Output = Result<Vec<Event>, StoreError>> + Send;

    /// Events created by `owner`, in no particular order.
    fn list_by_owner(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<Event>, StoreError>> + Send;

    /// Run `action` against event `id` atomically.
    ///
    /// Returns the state after reduction. A rejected action leaves the record
    /// untouched and reports its reason in [`EventState::last_error`].
    fn send(
        &self,
        id: EventId,
        action: EventAction,
    ) -> impl Future<Output = Result<EventState, StoreError>> + Send;

    /// Check the store is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The event store selected at startup.
#[derive(Clone, Debug)]
pub enum EventBackend {
    /// In-process maps
    Memory(InMemoryEventStore),
    /// `PostgreSQL`
    Postgres(PostgresEventStore),
}

impl EventBackend {
    /// Release the backend's connections.
    pub async fn close(&self) {
        if let Self::Postgres(store) = self {
            store.close().await;
        }
    }
}

impl EventStore for EventBackend {
    async fn get(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        match self {
            Self::Memory(store) => store.get(id).await,
            Self::Postgres(store) => store.get(id).await,
        }
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        match self {
            Self::Memory(store) => store.list(filter).await,
            Self::Postgres(store) => store.list(filter).await,
        }
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Event>, StoreError> {
        match self {
            Self::Memory(store) => store.list_by_owner(owner).await,
            Self::Postgres(store) => store.list_by_owner(owner).await,
        }
    }

    async fn send(&self, id: EventId, action: EventAction) -> Result<EventState, StoreError> {
        match self {
            Self::Memory(store) => store.send(id, action).await,
            Self::Postgres(store) => store.send(id, action).await,
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.ping().await,
            Self::Postgres(store) => store.ping().await,
        }
    }
}
