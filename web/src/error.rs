//! Error types for web handlers.
//!
//! [`AppError`] is the single error type handlers return. Domain errors from
//! the event service and the auth service convert into it with `?`, picking
//! the status code and a stable machine-readable `code`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use evently_auth::AuthError;
use evently_core::error::EventError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Event>, AppError> {
///     let event = state.events.get(id).await?; // EventError -> AppError
///     Ok(Json(event))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attach the underlying failure for the logs.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 with code `VALIDATION_ERROR`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "VALIDATION_ERROR")
    }

    /// 401 with code `UNAUTHORIZED`.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// 403 with code `FORBIDDEN`.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN")
    }

    /// 404 with code `NOT_FOUND`.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    /// Duplicate registration.
    ///
    /// Reported as 400 so existing clients that only branch on 400 keep
    /// working; the `CONFLICT` code tells the cases apart.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "CONFLICT")
    }

    /// 400 for a business-rule rejection such as a full event.
    #[must_use]
    pub fn rejected(message: impl Into<String>, code: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, code)
    }

    /// 500 with code `INTERNAL_SERVER_ERROR`.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Human-readable error message.
    message: String,
    /// Error code (for client error handling).
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            message: self.message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        let message = err.to_string();
        match err {
            EventError::Validation(_) => Self::validation(message),
            EventError::NotFound => Self::not_found(message),
            EventError::Forbidden(_) => Self::forbidden(message),
            EventError::AlreadyRegistered => Self::rejected(message, "ALREADY_REGISTERED"),
            EventError::Full => Self::rejected(message, "EVENT_FULL"),
            EventError::Internal(detail) => {
                Self::internal("An internal error occurred").with_source(anyhow::anyhow!(detail))
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if !err.is_user_error() {
            return Self::internal("An internal error occurred")
                .with_source(anyhow::anyhow!(err.detail()));
        }
        if err.is_conflict() {
            return Self::conflict(err.to_string());
        }
        if err.is_unauthenticated() {
            return Self::unauthorized(err.to_string());
        }
        Self::validation(err.to_string())
    }
}
