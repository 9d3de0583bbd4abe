//! Authentication providers.
//!
//! This module defines the user record and the storage trait the auth
//! service depends on. Concrete stores live in [`crate::stores`]; the service
//! only ever sees the trait, which keeps it testable against the in-memory
//! implementation.

use chrono::{DateTime, Utc};
use evently_core::types::UserId;
use serde::{Deserialize, Serialize};

pub mod user;

pub use user::UserRepository;

/// A registered account.
///
/// `password_hash` is an Argon2 PHC string and never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Display name, unique
    pub username: String,
    /// Login key, unique, stored lowercase
    pub email: String,
    /// Argon2 PHC hash
    pub password_hash: String,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public fields of this user.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name
    pub username: String,
    /// Email
    pub email: String,
}
