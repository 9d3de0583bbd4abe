//! The event entity and the inputs that create or change it.

use crate::types::{Capacity, EventId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled event with a bounded attendee list.
///
/// `attendees` preserves RSVP order and never holds the same user twice.
/// Its length never exceeds `max_attendees`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier
    #[serde(rename = "_id")]
    pub id: EventId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Free-text location
    pub location: String,
    /// Capacity
    pub max_attendees: Capacity,
    /// Public path of the event image, if one was uploaded
    pub image_url: Option<String>,
    /// Owning user, fixed at creation
    pub created_by: UserId,
    /// Attendees in RSVP order
    pub attendees: Vec<UserId>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether `user` created this event.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.created_by == user
    }

    /// Whether `user` has already RSVP'd.
    #[must_use]
    pub fn has_attendee(&self, user: UserId) -> bool {
        self.attendees.contains(&user)
    }

    /// Whether every seat is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        !self.max_attendees.admits(self.attendees.len() + 1)
    }

    /// Seats still available.
    #[must_use]
    pub fn seats_remaining(&self) -> u32 {
        let taken = u32::try_from(self.attendees.len()).unwrap_or(u32::MAX);
        self.max_attendees.get().saturating_sub(taken)
    }
}

/// Fields supplied when creating an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDraft {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Free-text location
    pub location: String,
    /// Requested capacity, validated by the reducer
    pub max_attendees: u32,
    /// Public path of an already stored image
    pub image_url: Option<String>,
}

/// A partial update. `None` keeps the current value, `Some` overwrites it.
///
/// An empty string is a real value here and is written as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventPatch {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New date
    pub date: Option<DateTime<Utc>>,
    /// New location
    pub location: Option<String>,
    /// New capacity
    pub max_attendees: Option<u32>,
    /// Public path of a newly stored image
    pub image_url: Option<String>,
}

impl EventPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.location.is_none()
            && self.max_attendees.is_none()
            && self.image_url.is_none()
    }
}
