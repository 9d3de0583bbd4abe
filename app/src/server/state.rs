//! Application state for the Evently HTTP server.
//!
//! The state is built once at startup from [`Config`], handed to the router
//! and cloned (cheaply) into every request. It owns the store handles; there
//! is no global connection.

use crate::config::{Config, StoreBackend};
use crate::services::EventService;
use crate::store::{EventBackend, InMemoryEventStore, PostgresEventStore, UserBackend};
use crate::uploads::LocalImageStore;
use chrono::Duration;
use evently_auth::stores::{InMemoryUserRepository, PostgresUserRepository};
use evently_auth::{AuthService, TokenIssuer};
use evently_core::aggregate::EventEnvironment;
use evently_core::environment::{Clock, SystemClock};
use evently_web::ReadinessProbe;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};

/// Auth service over the configured user store.
pub type Auth = AuthService<UserBackend>;

/// Event service over the configured stores.
pub type Events = EventService<EventBackend, UserBackend>;

/// Application state shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Registration, login and identity resolution
    pub auth: Auth,
    /// Event operations
    pub events: Events,
    /// Where uploaded images go
    pub images: LocalImageStore,
}

impl AppState {
    /// Assemble state from already-built parts.
    #[must_use]
    pub const fn new(auth: Auth, events: Events, images: LocalImageStore) -> Self {
        Self {
            auth,
            events,
            images,
        }
    }

    /// Build state from configuration, connecting and migrating the database
    /// when the `postgres` backend is selected.
    ///
    /// # Errors
    ///
    /// Returns error if the database is unreachable, a migration fails or the
    /// upload directory cannot be created.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let env = EventEnvironment::new(clock.clone());

        if config.auth.generated_secret {
            warn!("JWT_SECRET is not set; using a random secret, credentials will not survive a restart");
        }
        let tokens = TokenIssuer::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.jwt_issuer.clone(),
            Duration::days(config.auth.token_ttl_days),
            clock.clone(),
        );

        let (users, events) = match config.store.backend {
            StoreBackend::Memory => {
                info!("Using in-memory stores");
                (
                    UserBackend::Memory(InMemoryUserRepository::new()),
                    EventBackend::Memory(InMemoryEventStore::new(env)),
                )
            }
            StoreBackend::Postgres => {
                info!(max_connections = config.store.max_connections, "Connecting to PostgreSQL...");
                let pool = PgPoolOptions::new()
                    .max_connections(config.store.max_connections)
                    .connect(&config.store.database_url)
                    .await?;

                let users = PostgresUserRepository::new(pool.clone());
                users.migrate().await?;
                let events = PostgresEventStore::new(pool, env);
                events.migrate().await?;
                info!("PostgreSQL connected and migrated");

                (UserBackend::Postgres(users), EventBackend::Postgres(events))
            }
        };

        let images = LocalImageStore::new(config.uploads.dir.clone(), clock.clone());
        images.ensure_dir().await?;

        let auth = AuthService::new(users, tokens, clock);
        let events = EventService::new(events, auth.clone());
        Ok(Self::new(auth, events, images))
    }

    /// Release store connections. Call once the server has stopped.
    pub async fn close(&self) {
        self.events.store().close().await;
    }
}

impl ReadinessProbe for AppState {
    async fn check_ready(&self) -> Result<(), String> {
        self.auth
            .ping()
            .await
            .map_err(|e| format!("user store: {}", e.detail()))?;
        self.events
            .ping()
            .await
            .map_err(|e| format!("event store: {e}"))
    }
}
