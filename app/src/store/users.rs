//! The user store selected at startup.

use evently_auth::stores::{InMemoryUserRepository, PostgresUserRepository};
use evently_auth::{Result, User, UserRepository};
use evently_core::types::UserId;

/// User storage backing the auth service.
#[derive(Clone, Debug)]
pub enum UserBackend {
    /// In-process maps
    Memory(InMemoryUserRepository),
    /// `PostgreSQL`
    Postgres(PostgresUserRepository),
}

impl UserRepository for UserBackend {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<User> {
        match self {
            Self::Memory(repo) => repo.get_user_by_id(user_id).await,
            Self::Postgres(repo) => repo.get_user_by_id(user_id).await,
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User> {
        match self {
            Self::Memory(repo) => repo.get_user_by_email(email).await,
            Self::Postgres(repo) => repo.get_user_by_email(email).await,
        }
    }

    async fn get_users_by_ids(&self, user_ids: &[UserId]) -> Result<Vec<User>> {
        match self {
            Self::Memory(repo) => repo.get_users_by_ids(user_ids).await,
            Self::Postgres(repo) => repo.get_users_by_ids(user_ids).await,
        }
    }

    async fn create_user(&self, user: &User) -> Result<User> {
        match self {
            Self::Memory(repo) => repo.create_user(user).await,
            Self::Postgres(repo) => repo.create_user(user).await,
        }
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        match self {
            Self::Memory(repo) => repo.email_exists(email).await,
            Self::Postgres(repo) => repo.email_exists(email).await,
        }
    }

    async fn ping(&self) -> Result<()> {
        match self {
            Self::Memory(repo) => repo.ping().await,
            Self::Postgres(repo) => repo.ping().await,
        }
    }
}
