//! Router configuration for Evently.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::{events, users};
use crate::config::UploadConfig;
use crate::uploads::UPLOADS_ROUTE;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use evently_web::correlation_id_layer;
use evently_web::handlers::{health_check, readiness_check};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `/health` and `/health/ready` for probes
/// - `/api/users/*` for registration, login and profile
/// - `/api/events/*` for event management and RSVPs
/// - `/uploads/*` serves stored images from `uploads.dir`
pub fn build_router(state: AppState, uploads: &UploadConfig) -> Router {
    let user_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/profile", get(users::profile));

    let event_routes = Router::new()
        .route("/create", post(events::create_event))
        .route("/all", get(events::list_events))
        .route("/my-events", get(events::my_events))
        .route(
            "/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/:id/rsvp", post(events::rsvp_event));

    let api_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/events", event_routes);

    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check::<AppState>))
        .nest("/api", api_routes)
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&uploads.dir))
        .layer(DefaultBodyLimit::max(uploads.max_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(correlation_id_layer())
        .with_state(state)
}
