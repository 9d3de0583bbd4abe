//! Authenticated-user extractor.
//!
//! ```rust,ignore
//! async fn profile(AuthUser(me): AuthUser) -> Json<UserProfile> {
//!     Json(me)
//! }
//! ```

use crate::server::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use evently_auth::UserProfile;
use evently_web::{AppError, BearerToken};

/// The user behind the request's bearer credential.
///
/// Rejects with 401 when the header is missing, the credential does not
/// verify or has expired, or the user it names no longer exists.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let profile = state.auth.resolve_identity(&token).await.map_err(|e| {
            tracing::debug!(error = %e, "Bearer credential rejected");
            AppError::from(e)
        })?;

        Ok(Self(profile))
    }
}
