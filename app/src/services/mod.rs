//! Application services.

pub mod events;

pub use events::{AttendeeView, EventService, EventView, OwnerRef};
