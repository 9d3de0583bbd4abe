//! Stateless bearer credentials.
//!
//! Credentials are HS256-signed JWTs carrying the user id, the username, the
//! issuer and an expiry. Verification needs only the signing secret and the
//! clock; nothing is stored server-side, so any instance holding the same
//! secret accepts the same credentials.

use crate::error::{AuthError, Result};
use crate::providers::User;
use chrono::{DateTime, Duration, Utc};
use evently_core::environment::Clock;
use evently_core::types::UserId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default credential lifetime.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// Claims carried inside a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Username at issue time
    pub username: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// The user this credential identifies.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if `sub` is not a user id.
    pub fn user_id(&self) -> Result<UserId> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// A freshly signed credential.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded JWT
    pub token: String,
    /// When it stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies credentials.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Create an issuer for the given HMAC secret.
    #[must_use]
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            ttl,
            clock,
        }
    }

    /// Credential lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a credential for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenSigning`] if encoding fails.
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        let issued_at = self.clock.now();
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenSigning(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, issuer and expiry.
    ///
    /// Expiry is checked against the injected clock rather than the system time.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExpired`] for an expired credential and
    /// [`AuthError::InvalidToken`] for any other verification failure.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Credential rejected");
            AuthError::InvalidToken
        })?;

        if data.claims.exp <= self.clock.now().timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
