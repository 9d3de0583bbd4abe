//! Axum integration for the Evently service.
//!
//! Handlers in the application crate stay thin: extract, call a service,
//! map the result. This crate supplies the shared pieces of that shell:
//!
//! - [`AppError`]: one error type for every handler, with conversions from
//!   the event and auth error taxonomies
//! - [`extractors`]: correlation ids and bearer credentials
//! - [`middleware`]: the correlation id layer
//! - [`handlers::health`]: liveness and readiness probes
//!
//! # Example
//!
//! ```ignore
//! use evently_web::{AppError, BearerToken};
//!
//! async fn me(
//!     State(state): State<AppState>,
//!     BearerToken(token): BearerToken,
//! ) -> Result<Json<UserProfile>, AppError> {
//!     Ok(Json(state.auth.resolve_identity(&token).await?))
//! }
//! ```

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId};
pub use handlers::ReadinessProbe;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
