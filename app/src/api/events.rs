//! Event endpoints.
//!
//! - POST /api/events/create - Create an event (requires auth, multipart)
//! - GET /api/events/all - List events, optionally filtered
//! - GET /api/events/my-events - Events created by the caller (requires auth)
//! - GET /api/events/:id - Event details
//! - PUT /api/events/:id - Update an event (requires ownership)
//! - DELETE /api/events/:id - Delete an event (requires ownership)
//! - POST /api/events/:id/rsvp - Reserve a seat (requires auth)

use super::auth::AuthUser;
use super::forms::EventForm;
use crate::server::state::AppState;
use crate::services::EventView;
use crate::uploads::{ImageStore, Upload};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use evently_core::error::EventError;
use evently_core::event::Event;
use evently_core::query::EventFilter;
use evently_core::types::EventId;
use evently_web::{AppError, CorrelationId};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the public listing. Blank values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    /// Case-insensitive title substring
    pub title: Option<String>,
    /// Case-insensitive location substring
    pub location: Option<String>,
    /// Calendar day, `YYYY-MM-DD`
    pub date: Option<String>,
}

impl ListEventsQuery {
    fn into_filter(self) -> Result<EventFilter, AppError> {
        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| AppError::validation("date must be formatted YYYY-MM-DD"))?,
            ),
        };

        Ok(EventFilter {
            title: self.title,
            location: self.location,
            date,
        }
        .normalized())
    }
}

/// Response after creating an event.
#[derive(Debug, Serialize)]
pub struct EventCreatedResponse {
    /// Success message
    pub message: &'static str,
    /// The stored event
    pub event: Event,
}

/// Response after a successful RSVP.
#[derive(Debug, Serialize)]
pub struct RsvpResponse {
    /// Success message
    pub message: &'static str,
    /// The event with the caller added
    pub event: Event,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Success message
    pub message: &'static str,
}

fn event_id(raw: &str) -> Result<EventId, AppError> {
    // A malformed id cannot name an event.
    raw.parse().map_err(|_| AppError::from(EventError::NotFound))
}

async fn store_image(state: &AppState, upload: Upload) -> Result<String, AppError> {
    state.images.store(upload).await.map_err(|e| {
        AppError::internal("Failed to store image").with_source(anyhow::Error::from(e))
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new event. The caller becomes its owner.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/events/create \
///   -H "Authorization: Bearer <token>" \
///   -F title="Rust Meetup" -F description="Talks and pizza" \
///   -F date=2025-06-01 -F location=Berlin -F maxAttendees=25 \
///   -F image=@poster.png
/// ```
///
/// # Errors
///
/// - 401 without a valid credential
/// - 400 for a non-image upload, missing fields or unparsable values
#[instrument(skip_all)]
pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    correlation_id: CorrelationId,
    mut form: EventForm,
) -> Result<(StatusCode, Json<EventCreatedResponse>), AppError> {
    let mut draft = form.draft()?;
    if let Some(upload) = form.take_image() {
        draft.image_url = Some(store_image(&state, upload).await?);
    }

    let event = state.events.create(me.id, draft).await?;

    info!(
        correlation_id = %correlation_id.0,
        event_id = %event.id,
        owner = %me.id,
        "Event created"
    );
    Ok((
        StatusCode::CREATED,
        Json(EventCreatedResponse {
            message: "Event created successfully",
            event,
        }),
    ))
}

/// List every event, soonest first.
///
/// # Errors
///
/// - 400 for a malformed `date`
#[instrument(skip_all)]
pub async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<ListEventsQuery>, QueryRejection>,
) -> Result<Json<Vec<EventView>>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    let events = state.events.list_all(query.into_filter()?).await?;
    Ok(Json(events))
}

/// Events created by the caller, with attendee emails.
#[instrument(skip_all)]
pub async fn my_events(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<Vec<EventView>>, AppError> {
    Ok(Json(state.events.list_owned(me.id).await?))
}

/// One event with owner and attendee profiles.
///
/// # Errors
///
/// - 404 if the id is malformed or no such event exists
#[instrument(skip_all)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventView>, AppError> {
    let id = event_id(&id)?;
    Ok(Json(state.events.get(id).await?))
}

/// Overwrite the fields present in the body. Only the owner may update.
///
/// # Errors
///
/// - 404 if the event does not exist
/// - 403 if the caller is not the owner
/// - 400 for unparsable values or a capacity below the attendee count
#[instrument(skip_all)]
pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    correlation_id: CorrelationId,
    Path(id): Path<String>,
    mut form: EventForm,
) -> Result<Json<Event>, AppError> {
    let id = event_id(&id)?;
    let mut patch = form.patch()?;
    if let Some(upload) = form.take_image() {
        patch.image_url = Some(store_image(&state, upload).await?);
    }

    let event = state.events.update(me.id, id, patch).await?;

    info!(correlation_id = %correlation_id.0, event_id = %id, "Event updated");
    Ok(Json(event))
}

/// Permanently delete an event. Only the owner may delete.
///
/// # Errors
///
/// - 404 if the event does not exist
/// - 403 if the caller is not the owner
#[instrument(skip_all)]
pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    correlation_id: CorrelationId,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = event_id(&id)?;
    state.events.delete(me.id, id).await?;

    info!(correlation_id = %correlation_id.0, event_id = %id, "Event deleted");
    Ok(Json(MessageResponse {
        message: "Event deleted successfully",
    }))
}

/// Reserve a seat for the caller.
///
/// # Errors
///
/// - 404 if the event does not exist
/// - 400 `ALREADY_REGISTERED` if the caller already holds a seat
/// - 400 `EVENT_FULL` if no seats remain
#[instrument(skip_all)]
pub async fn rsvp_event(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    correlation_id: CorrelationId,
    Path(id): Path<String>,
) -> Result<Json<RsvpResponse>, AppError> {
    let id = event_id(&id)?;
    let event = state.events.rsvp(me.id, id).await?;

    info!(
        correlation_id = %correlation_id.0,
        event_id = %id,
        attendee = %me.id,
        "RSVP accepted"
    );
    Ok(Json(RsvpResponse {
        message: "RSVP successful",
        event,
    }))
}
