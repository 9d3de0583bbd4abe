//! Error taxonomy for event operations.

use std::fmt;
use thiserror::Error;

/// The ownership-gated mutation a caller attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// Changing event fields
    Edit,
    /// Removing the event
    Delete,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edit => f.write_str("edit"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Errors produced by the event service and its reducer.
///
/// Every variant except [`EventError::Internal`] is a business-rule outcome
/// that the caller can act on. Messages are user-facing.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum EventError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// The referenced event does not exist.
    #[error("Event not found")]
    NotFound,

    /// The acting user does not own the event.
    #[error("You are not authorized to {0} this event")]
    Forbidden(Mutation),

    /// The acting user already appears in the attendee list.
    #[error("You have already RSVP'd to this event.")]
    AlreadyRegistered,

    /// The event has no remaining seats.
    #[error("This event is fully booked.")]
    Full,

    /// Store or infrastructure failure. The message is for operators only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EventError {
    /// Build a [`EventError::Validation`] from any message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Build a [`EventError::Internal`] from any displayable failure.
    #[must_use]
    pub fn internal(error: impl fmt::Display) -> Self {
        Self::Internal(error.to_string())
    }

    /// Whether the error was caused by the request rather than the system.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

/// Result type for event operations.
pub type Result<T> = std::result::Result<T, EventError>;
