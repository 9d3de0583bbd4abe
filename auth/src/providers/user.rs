//! User repository trait.

use super::User;
use crate::error::Result;
use evently_core::types::UserId;
use std::future::Future;

/// User repository.
///
/// This trait abstracts over user storage (in-memory or PostgreSQL).
/// Implementations must enforce unique emails and usernames themselves so
/// that two concurrent registrations cannot both succeed.
pub trait UserRepository: Send + Sync {
    /// Get user by ID.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Database query fails
    /// - User not found → `AuthError::UserNotFound`
    fn get_user_by_id(&self, user_id: UserId) -> impl Future<Output = Result<User>> + Send;

    /// Get user by email.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Database query fails
    /// - User not found → `AuthError::UserNotFound`
    fn get_user_by_email(&self, email: &str) -> impl Future<Output = Result<User>> + Send;

    /// Get every user whose id is in `user_ids`. Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if database query fails.
    fn get_users_by_ids(&self, user_ids: &[UserId]) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// Create user.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Database query fails
    /// - Email already exists → `AuthError::EmailTaken`
    /// - Username already exists → `AuthError::UsernameTaken`
    fn create_user(&self, user: &User) -> impl Future<Output = Result<User>> + Send;

    /// Check if email exists.
    ///
    /// # Returns
    ///
    /// `true` if email is already registered.
    ///
    /// # Errors
    ///
    /// Returns error if database query fails.
    fn email_exists(&self, email: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Check that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot serve queries.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;
}
