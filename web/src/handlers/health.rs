//! Health check endpoints.
//!
//! `GET /health` is a liveness probe and never touches dependencies.
//! `GET /health/ready` asks the router state, through [`ReadinessProbe`],
//! whether its stores are reachable.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::future::Future;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok`
    pub status: &'static str,
    /// Crate version of the running binary
    pub version: &'static str,
}

/// Liveness check.
///
/// ```text
/// GET /health
/// {"status":"ok","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// `ready` or `unavailable`
    pub status: &'static str,
    /// What failed, when not ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Dependencies a server must reach before it takes traffic.
pub trait ReadinessProbe: Clone + Send + Sync + 'static {
    /// Check every dependency, returning a description of the first failure.
    fn check_ready(&self) -> impl Future<Output = Result<(), String>> + Send;
}

/// Readiness check.
///
/// Returns 200 when the probe succeeds and 503 otherwise.
pub async fn readiness_check<S: ReadinessProbe>(
    State(state): State<S>,
) -> (StatusCode, Json<ReadinessResponse>) {
    match state.check_ready().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                error: None,
            }),
        ),
        Err(error) => {
            tracing::warn!(%error, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "unavailable",
                    error: Some(error),
                }),
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use axum_test::TestServer;

    #[derive(Clone)]
    struct Probe(bool);

    impl ReadinessProbe for Probe {
        async fn check_ready(&self) -> Result<(), String> {
            if self.0 { Ok(()) } else { Err("store unreachable".to_string()) }
        }
    }

    fn server(ready: bool) -> TestServer {
        let app = Router::new()
            .route("/health", get(health_check))
            .route("/health/ready", get(readiness_check::<Probe>))
            .with_state(Probe(ready));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_liveness_reports_version() {
        let response = server(false).get("/health").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_readiness_follows_probe() {
        server(true).get("/health/ready").await.assert_status_ok();

        let response = server(false).get("/health/ready").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "store unreachable");
    }
}
