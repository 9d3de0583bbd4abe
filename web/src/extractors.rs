//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation id
//! - [`BearerToken`]: the credential from `Authorization: Bearer <token>`
//!
//! # Examples
//!
//! ```ignore
//! use evently_web::extractors::{BearerToken, CorrelationId};
//!
//! async fn handler(
//!     correlation_id: CorrelationId,
//!     BearerToken(token): BearerToken,
//! ) -> Result<Json<Response>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Processing request");
//!     Ok(Json(response))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use evently_auth::AuthError;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Taken from the request extensions when [`crate::middleware::correlation_id_layer`]
/// is installed, otherwise from the `X-Correlation-ID` header, otherwise a
/// fresh UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// Read the id from request headers, generating one if absent or malformed.
    #[must_use]
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let id = headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);
        Self(id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Bearer credential extracted from the `Authorization` header.
///
/// Rejects with 401 `Not authorized, no token` when the header is missing,
/// uses another scheme, or carries an empty token. The token itself is not
/// verified here.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self(token.to_string()))
            .ok_or_else(|| AppError::from(AuthError::MissingToken))
    }
}
