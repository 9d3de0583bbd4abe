//! User endpoints.
//!
//! - POST /api/users/register - Create an account and sign in
//! - POST /api/users/login - Exchange email and password for a credential
//! - GET /api/users/profile - The caller's own profile (requires auth)

use super::auth::AuthUser;
use crate::server::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use evently_auth::{AuthSession, LoginRequest, RegisterRequest, UserProfile};
use evently_web::{AppError, CorrelationId};
use tracing::{info, instrument};

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

/// Register a new user.
///
/// Returns 201 with the profile and a bearer credential.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/users/register \
///   -H "Content-Type: application/json" \
///   -d '{"username": "alice", "email": "alice@example.com", "password": "secret1"}'
/// ```
///
/// # Errors
///
/// - 400 `VALIDATION_ERROR` for missing fields or a malformed email
/// - 400 `CONFLICT` if the email or username is taken
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthSession>), AppError> {
    let request = json_body(payload)?;
    let session = state.auth.register(request).await?;

    info!(
        correlation_id = %correlation_id.0,
        user_id = %session.profile.id,
        "User registered"
    );
    Ok((StatusCode::CREATED, Json(session)))
}

/// Sign in with email and password.
///
/// # Errors
///
/// - 400 `VALIDATION_ERROR` for missing fields
/// - 401 `UNAUTHORIZED` for an unknown email or wrong password
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthSession>, AppError> {
    let request = json_body(payload)?;
    let session = state.auth.authenticate(request).await?;

    info!(
        correlation_id = %correlation_id.0,
        user_id = %session.profile.id,
        "User logged in"
    );
    Ok(Json(session))
}

/// The authenticated caller's profile.
#[instrument(skip_all)]
pub async fn profile(AuthUser(me): AuthUser) -> Json<UserProfile> {
    Json(me)
}
