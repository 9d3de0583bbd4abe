//! PostgreSQL user repository implementation.
//!
//! # Example
//!
//! ```no_run
//! use evently_auth::stores::postgres::PostgresUserRepository;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/evently").await?;
//! let repo = PostgresUserRepository::new(pool);
//! repo.migrate().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::providers::{User, UserRepository};
use chrono::{DateTime, Utc};
use evently_core::types::UserId;
use sqlx::PgPool;
use uuid::Uuid;

/// Row shape of the `users` table.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL user repository.
#[derive(Clone, Debug)]
pub struct PostgresUserRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new PostgreSQL user repository.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// Other crates keep their own migrations in the same database, so
    /// versions this crate does not know about are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator
            .run(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

fn database_error(context: &str, e: &sqlx::Error) -> AuthError {
    AuthError::DatabaseError(format!("{context}: {e}"))
}

impl UserRepository for PostgresUserRepository {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<User> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to get user", &e))?
        .map(User::from)
        .ok_or(AuthError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to get user", &e))?
        .map(User::from)
        .ok_or(AuthError::UserNotFound)
    }

    async fn get_users_by_ids(&self, user_ids: &[UserId]) -> Result<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = user_ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = ANY($1)
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to get users", &e))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create_user(&self, user: &User) -> Result<User> {
        sqlx::query(
            r"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Map unique constraint violations onto the field that clashed
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return match db_err.constraint() {
                        Some("users_username_key") => AuthError::UsernameTaken,
                        _ => AuthError::EmailTaken,
                    };
                }
            }
            database_error("Failed to create user", &e)
        })?;

        Ok(user.clone())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| database_error("Failed to check email", &e))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| database_error("Health check failed", &e))
    }
}
