//! In-memory user repository.
//!
//! Backs the development server and every test that does not need PostgreSQL.

use crate::error::{AuthError, Result};
use crate::providers::{User, UserRepository};
use evently_core::types::UserId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<UserId, User>,
    by_email: HashMap<String, UserId>,
    by_username: HashMap<String, UserId>,
}

/// In-memory user repository.
///
/// Cloning shares the underlying map. Uniqueness checks and the insert happen
/// under one write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Users>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().map_or(0, |users| users.by_id.len())
    }

    /// Whether no users are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserRepository for InMemoryUserRepository {
    fn get_user_by_id(&self, user_id: UserId) -> impl Future<Output = Result<User>> + Send {
        let users = Arc::clone(&self.users);

        async move {
            users
                .read()
                .map_err(|_| AuthError::InternalError)?
                .by_id
                .get(&user_id)
                .cloned()
                .ok_or(AuthError::UserNotFound)
        }
    }

    fn get_user_by_email(&self, email: &str) -> impl Future<Output = Result<User>> + Send {
        let users = Arc::clone(&self.users);
        let email = email.to_string();

        async move {
            let guard = users.read().map_err(|_| AuthError::InternalError)?;
            guard
                .by_email
                .get(&email)
                .and_then(|id| guard.by_id.get(id))
                .cloned()
                .ok_or(AuthError::UserNotFound)
        }
    }

    fn get_users_by_ids(&self, user_ids: &[UserId]) -> impl Future<Output = Result<Vec<User>>> + Send {
        let users = Arc::clone(&self.users);
        let user_ids = user_ids.to_vec();

        async move {
            let guard = users.read().map_err(|_| AuthError::InternalError)?;
            Ok(user_ids
                .iter()
                .filter_map(|id| guard.by_id.get(id))
                .cloned()
                .collect())
        }
    }

    fn create_user(&self, user: &User) -> impl Future<Output = Result<User>> + Send {
        let users = Arc::clone(&self.users);
        let user = user.clone();

        async move {
            let mut guard = users.write().map_err(|_| AuthError::InternalError)?;

            if guard.by_email.contains_key(&user.email) {
                return Err(AuthError::EmailTaken);
            }
            if guard.by_username.contains_key(&user.username) {
                return Err(AuthError::UsernameTaken);
            }

            guard.by_email.insert(user.email.clone(), user.id);
            guard.by_username.insert(user.username.clone(), user.id);
            guard.by_id.insert(user.id, user.clone());

            Ok(user)
        }
    }

    fn email_exists(&self, email: &str) -> impl Future<Output = Result<bool>> + Send {
        let users = Arc::clone(&self.users);
        let email = email.to_string();

        async move {
            Ok(users
                .read()
                .map_err(|_| AuthError::InternalError)?
                .by_email
                .contains_key(&email))
        }
    }

    fn ping(&self) -> impl Future<Output = Result<()>> + Send {
        let healthy = self.users.read().is_ok();

        async move {
            if healthy {
                Ok(())
            } else {
                Err(AuthError::InternalError)
            }
        }
    }
}
