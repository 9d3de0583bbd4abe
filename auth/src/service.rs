//! The auth service: registration, login and identity resolution.

use crate::error::{AuthError, Result};
use crate::password::{hash_password, verify_password};
use crate::providers::{User, UserProfile, UserRepository};
use crate::token::TokenIssuer;
use crate::utils::{is_valid_email, normalize_email};
use evently_core::environment::Clock;
use evently_core::types::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Registration input. Missing JSON fields deserialize as empty strings.
#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    /// Display name
    #[serde(default)]
    pub username: String,
    /// Login email
    #[serde(default)]
    pub email: String,
    /// Plain-text password
    #[serde(default)]
    pub password: String,
}

/// Login input.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    /// Login email
    #[serde(default)]
    pub email: String,
    /// Plain-text password
    #[serde(default)]
    pub password: String,
}

/// Profile plus a freshly issued credential.
///
/// Serializes flat: `{ "_id", "username", "email", "token" }`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    /// Public profile
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Bearer credential
    pub token: String,
}

/// Registration, login and credential verification over a [`UserRepository`].
#[derive(Clone)]
pub struct AuthService<R> {
    users: R,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
}

impl<R: UserRepository> AuthService<R> {
    /// Create a new auth service.
    #[must_use]
    pub fn new(users: R, tokens: TokenIssuer, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            tokens,
            clock,
        }
    }

    /// The underlying user store.
    #[must_use]
    pub const fn users(&self) -> &R {
        &self.users
    }

    /// Register a new user and sign them in.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingFields`] if any field is empty
    /// - [`AuthError::InvalidEmail`] if the email is malformed
    /// - [`AuthError::EmailTaken`] / [`AuthError::UsernameTaken`] on duplicates
    /// - System errors if hashing, signing or the store fail
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession> {
        let username = request.username.trim().to_string();
        let email = normalize_email(&request.email);

        if username.is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if self.users.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))??;

        let user = self
            .users
            .create_user(&User {
                id: UserId::new(),
                username,
                email,
                password_hash,
                created_at: self.clock.now(),
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        self.session_for(&user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email or a
    /// wrong password, and system errors if the store or hashing fail.
    #[instrument(skip(self, request))]
    pub async fn authenticate(&self, request: LoginRequest) -> Result<AuthSession> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = match self.users.get_user_by_email(&email).await {
            Ok(user) => user,
            Err(AuthError::UserNotFound) => {
                warn!("Login attempt for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let password = request.password;
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))??;

        if !matches {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        self.session_for(&user)
    }

    /// Verify a bearer credential and load the identity it names.
    ///
    /// # Errors
    ///
    /// Returns an unauthenticated error ([`AuthError::is_unauthenticated`]) if
    /// the credential is invalid or expired, or its user no longer exists.
    #[instrument(skip_all)]
    pub async fn resolve_identity(&self, token: &str) -> Result<UserProfile> {
        let claims = self.tokens.verify(token)?;
        let user_id = claims.user_id()?;
        self.profile(user_id).await
    }

    /// Public profile of a user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] for an unknown id.
    pub async fn profile(&self, user_id: UserId) -> Result<UserProfile> {
        Ok(self.users.get_user_by_id(user_id).await?.profile())
    }

    /// Public profiles for a set of ids, keyed by id. Unknown ids are absent.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn profiles(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, UserProfile>> {
        let users = self.users.get_users_by_ids(user_ids).await?;
        Ok(users
            .into_iter()
            .map(|user| (user.id, user.profile()))
            .collect())
    }

    /// Check the user store.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    pub async fn ping(&self) -> Result<()> {
        self.users.ping().await
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        let issued = self.tokens.issue(user)?;
        Ok(AuthSession {
            profile: user.profile(),
            token: issued.token,
        })
    }
}

impl<R> std::fmt::Debug for AuthService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
