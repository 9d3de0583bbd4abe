//! # Evently Authentication
//!
//! Registration, login and stateless bearer credentials for the Evently service.
//!
//! ## Features
//!
//! - **Password login**: Argon2id hashes, never exposed outside the crate
//! - **Stateless credentials**: signed JWTs with a 30-day expiry, verifiable by
//!   any instance that knows the secret
//! - **Pluggable storage**: an in-memory store for development and tests, and a
//!   PostgreSQL store behind the `postgres` feature
//!
//! ## Example
//!
//! ```rust
//! use evently_auth::{AuthService, InMemoryUserRepository, RegisterRequest, TokenIssuer};
//! use evently_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> evently_auth::Result<()> {
//! let clock = Arc::new(SystemClock);
//! let tokens = TokenIssuer::new(b"secret", "evently", chrono::Duration::days(30), clock.clone());
//! let auth = AuthService::new(InMemoryUserRepository::new(), tokens, clock);
//!
//! let session = auth
//!     .register(RegisterRequest {
//!         username: "alice".to_string(),
//!         email: "a@x.com".to_string(),
//!         password: "secret1".to_string(),
//!     })
//!     .await?;
//!
//! let me = auth.resolve_identity(&session.token).await?;
//! assert_eq!(me.username, "alice");
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod error;
pub mod password;
pub mod providers;
pub mod service;
pub mod stores;
pub mod token;
pub mod utils;

// Re-exports
pub use error::{AuthError, Result};
pub use providers::{User, UserProfile, UserRepository};
pub use service::{AuthService, AuthSession, LoginRequest, RegisterRequest};
pub use stores::InMemoryUserRepository;
pub use token::{Claims, TokenIssuer};
