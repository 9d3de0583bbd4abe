//! Error types for registration, login and credential verification.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the auth service.
///
/// Messages are user-facing. System errors carry operator detail in their
/// payload but display a generic message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════

    /// Username, email or password was empty.
    #[error("All fields are required")]
    MissingFields,

    /// Email does not look like `local@domain`.
    #[error("Please provide a valid email address")]
    InvalidEmail,

    // ═══════════════════════════════════════════════════════════
    // Conflicts
    // ═══════════════════════════════════════════════════════════

    /// A user with this email is already registered.
    #[error("User already exists")]
    EmailTaken,

    /// A user with this username is already registered.
    #[error("Username is already taken")]
    UsernameTaken,

    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// Unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No bearer credential was presented.
    #[error("Not authorized, no token")]
    MissingToken,

    /// Signature, issuer or claim check failed.
    #[error("Not authorized, token failed")]
    InvalidToken,

    /// Credential is past its expiry.
    #[error("Not authorized, token expired")]
    TokenExpired,

    /// The identity a credential refers to does not exist.
    #[error("User not found")]
    UserNotFound,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Password hashing or hash parsing failed.
    #[error("Internal error")]
    PasswordHash(String),

    /// Credential signing failed.
    #[error("Internal error")]
    TokenSigning(String),

    /// User store operation failed.
    #[error("Internal error")]
    DatabaseError(String),

    /// Any other internal failure (should not be exposed to users).
    #[error("Internal error")]
    InternalError,
}

impl AuthError {
    /// Returns `true` if this error is due to invalid user input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use evently_auth::AuthError;
    /// assert!(AuthError::InvalidCredentials.is_user_error());
    /// assert!(!AuthError::InternalError.is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(
            self,
            Self::PasswordHash(_)
                | Self::TokenSigning(_)
                | Self::DatabaseError(_)
                | Self::InternalError
        )
    }

    /// Returns `true` if the caller failed to prove who they are.
    ///
    /// # Examples
    ///
    /// ```
    /// # use evently_auth::AuthError;
    /// assert!(AuthError::TokenExpired.is_unauthenticated());
    /// assert!(!AuthError::EmailTaken.is_unauthenticated());
    /// ```
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::MissingToken
                | Self::InvalidToken
                | Self::TokenExpired
                | Self::UserNotFound
        )
    }

    /// Returns `true` for duplicate-registration errors.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::EmailTaken | Self::UsernameTaken)
    }

    /// Detail for operator logs. Equal to the display message for user errors.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::PasswordHash(detail)
            | Self::TokenSigning(detail)
            | Self::DatabaseError(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}
