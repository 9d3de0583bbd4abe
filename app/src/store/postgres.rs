//! `PostgreSQL` event store.
//!
//! Events live in one `events` table with the attendee list stored as a
//! `UUID[]` column. [`EventStore::send`] opens a transaction, locks the row
//! with `SELECT ... FOR UPDATE`, runs the reducer on the locked copy and
//! writes the effects before committing. Concurrent sends for the same event
//! queue on the row lock, so two RSVPs for the last seat see each other.
//!
//! # Example
//!
//! ```no_run
//! use evently::store::PostgresEventStore;
//! use evently_core::aggregate::EventEnvironment;
//! use evently_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/evently").await?;
//! let store = PostgresEventStore::new(pool, EventEnvironment::new(Arc::new(SystemClock)));
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

use super::{EventStore, StoreError};
use chrono::{DateTime, Utc};
use evently_core::aggregate::{EventAction, EventEnvironment, EventReducer, EventState};
use evently_core::effect::{Effect, StoreOperation};
use evently_core::event::Event;
use evently_core::query::EventFilter;
use evently_core::reducer::Reducer;
use evently_core::types::{Capacity, EventId, UserId};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const SELECT_EVENT: &str = r"
    SELECT id, title, description, date, location, max_attendees, image_url,
           created_by, attendees, created_at, updated_at
    FROM events
";

/// Row shape of the `events` table.
#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    date: DateTime<Utc>,
    location: String,
    max_attendees: i32,
    image_url: Option<String>,
    created_by: Uuid,
    attendees: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let id = EventId::from_uuid(row.id);
        let max_attendees = u32::try_from(row.max_attendees)
            .ok()
            .and_then(|seats| Capacity::new(seats).ok())
            .ok_or_else(|| StoreError::Corrupt {
                id,
                reason: format!("max_attendees = {}", row.max_attendees),
            })?;

        Ok(Self {
            id,
            title: row.title,
            description: row.description,
            date: row.date,
            location: row.location,
            max_attendees,
            image_url: row.image_url,
            created_by: UserId::from_uuid(row.created_by),
            attendees: row.attendees.into_iter().map(UserId::from_uuid).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_events(rows: Vec<EventRow>) -> Result<Vec<Event>, StoreError> {
    rows.into_iter().map(Event::try_from).collect()
}

/// `PostgreSQL` event store.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
    reducer: EventReducer,
    env: EventEnvironment,
}

impl PostgresEventStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool, env: EventEnvironment) -> Self {
        Self {
            pool,
            reducer: EventReducer::new(),
            env,
        }
    }

    /// Run database migrations.
    ///
    /// The user tables are migrated by the auth crate against the same
    /// database, so versions this crate does not know about are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator.run(&self.pool).await?;
        Ok(())
    }

    /// Close the connection pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn lock_row(
        tx: &mut Transaction<'_, Postgres>,
        id: EventId,
    ) -> Result<Option<Event>, StoreError> {
        let query = format!("{SELECT_EVENT} WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, EventRow>(&query)
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?
            .map(Event::try_from)
            .transpose()
    }

    async fn save(tx: &mut Transaction<'_, Postgres>, event: &Event) -> Result<(), StoreError> {
        let attendees: Vec<Uuid> = event.attendees.iter().map(|id| *id.as_uuid()).collect();
        let max_attendees = i32::try_from(event.max_attendees.get()).map_err(|_| StoreError::Corrupt {
            id: event.id,
            reason: format!("max_attendees = {} does not fit the column", event.max_attendees),
        })?;

        sqlx::query(
            r"
            INSERT INTO events (
                id, title, description, date, location, max_attendees, image_url,
                created_by, attendees, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                date = EXCLUDED.date,
                location = EXCLUDED.location,
                max_attendees = EXCLUDED.max_attendees,
                image_url = EXCLUDED.image_url,
                attendees = EXCLUDED.attendees,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.location)
        .bind(max_attendees)
        .bind(&event.image_url)
        .bind(event.created_by.as_uuid())
        .bind(&attendees)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn remove(tx: &mut Transaction<'_, Postgres>, id: EventId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for PostgresEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresEventStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl EventStore for PostgresEventStore {
    async fn get(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let query = format!("{SELECT_EVENT} WHERE id = $1");
        sqlx::query_as::<_, EventRow>(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Event::try_from)
            .transpose()
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        // Substring matching uses strpos so user input needs no LIKE escaping.
        let query = format!(
            r"{SELECT_EVENT}
            WHERE ($1::text IS NULL OR strpos(lower(title), lower($1)) > 0)
              AND ($2::text IS NULL OR strpos(lower(location), lower($2)) > 0)
              AND ($3::date IS NULL OR (date AT TIME ZONE 'UTC')::date = $3)
            "
        );
        let rows = sqlx::query_as::<_, EventRow>(&query)
            .bind(filter.title.as_deref())
            .bind(filter.location.as_deref())
            .bind(filter.date)
            .fetch_all(&self.pool)
            .await?;
        into_events(rows)
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Event>, StoreError> {
        let query = format!("{SELECT_EVENT} WHERE created_by = $1");
        let rows = sqlx::query_as::<_, EventRow>(&query)
            .bind(owner.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        into_events(rows)
    }

    async fn send(&self, id: EventId, action: EventAction) -> Result<EventState, StoreError> {
        let mut tx = self.pool.begin().await?;

        let mut state = EventState::loaded(Self::lock_row(&mut tx, id).await?);
        let effects = self.reducer.reduce(&mut state, action, &self.env);

        for operation in Effect::chain(effects.into_vec()).into_operations() {
            match operation {
                StoreOperation::Save(event) => Self::save(&mut tx, &event).await?,
                StoreOperation::Remove(event_id) => Self::remove(&mut tx, event_id).await?,
            }
        }

        tx.commit().await?;
        Ok(state)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
