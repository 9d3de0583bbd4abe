//! HTTP API handlers, organized by resource.

pub mod auth;
pub mod events;
pub mod forms;
pub mod users;

pub use auth::AuthUser;
pub use events::{create_event, delete_event, get_event, list_events, my_events, rsvp_event, update_event};
pub use forms::EventForm;
pub use users::{login, profile, register};
