//! HTTP API integration tests.
//!
//! Drives the full router (in-memory stores, temporary upload directory)
//! through `axum-test`: status codes, JSON shapes, bearer auth, multipart
//! uploads and the static `/uploads` route.
//!
//! Run with: `cargo test -p evently --test http_api_test`

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect
#![allow(clippy::too_many_lines)] // Scenarios read top to bottom

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use evently::config::{AuthConfig, Config, ServerConfig, StoreBackend, StoreConfig, UploadConfig};
use evently::{AppState, build_router};
use serde_json::{Value, json};
use tempfile::TempDir;

struct Harness {
    server: TestServer,
    _uploads: TempDir,
}

async fn harness() -> Harness {
    evently_testing::init_tracing();

    let uploads = tempfile::tempdir().unwrap();
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            database_url: String::new(),
            max_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: "http-test-secret".to_string(),
            jwt_issuer: "evently".to_string(),
            token_ttl_days: 30,
            generated_secret: false,
        },
        uploads: UploadConfig {
            dir: uploads.path().to_path_buf(),
            max_bytes: 1024 * 1024,
        },
    };

    let state = AppState::from_config(&config).await.unwrap();
    let server = TestServer::new(build_router(state, &config.uploads)).unwrap();
    Harness {
        server,
        _uploads: uploads,
    }
}

/// Register `name` and return the bearer credential.
async fn register(server: &TestServer, name: &str) -> String {
    let response = server
        .post("/api/users/register")
        .json(&json!({
            "username": name,
            "email": format!("{name}@x.com"),
            "password": "secret1",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

fn event_form(title: &str, seats: u32) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title)
        .add_text("description", "Talks and pizza")
        .add_text("date", "2030-06-01")
        .add_text("location", "Berlin")
        .add_text("maxAttendees", seats.to_string())
}

/// Create an event as the holder of `token` and return its id.
async fn create_event(server: &TestServer, token: &str, title: &str, seats: u32) -> String {
    let response = server
        .post("/api/events/create")
        .authorization_bearer(token)
        .multipart(event_form(title, seats))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["event"]["_id"].as_str().unwrap().to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let h = harness().await;

    let health = h.server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.json::<Value>()["status"], "ok");

    let ready = h.server.get("/health/ready").await;
    assert_eq!(ready.status_code(), StatusCode::OK);
    assert_eq!(ready.json::<Value>()["status"], "ready");
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_register_then_duplicate_email_conflicts() {
    println!("🧪 Scenario: alice registers twice");
    let h = harness().await;

    let first = h
        .server
        .post("/api/users/register")
        .json(&json!({ "username": "alice", "email": "a@x.com", "password": "secret1" }))
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);
    let body = first.json::<Value>();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "a@x.com");
    assert!(body["_id"].is_string());
    assert!(body["token"].is_string());
    assert!(body.get("password").is_none());

    let second = h
        .server
        .post("/api/users/register")
        .json(&json!({ "username": "alice2", "email": "a@x.com", "password": "secret1" }))
        .await;
    assert_eq!(second.status_code(), StatusCode::BAD_REQUEST);
    let body = second.json::<Value>();
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["message"], "User already exists");

    println!("  ✅ Duplicate rejected");
}

#[tokio::test]
async fn test_register_requires_all_fields() {
    let h = harness().await;

    let response = h
        .server
        .post("/api/users/register")
        .json(&json!({ "username": "alice", "email": "a@x.com" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "All fields are required");
}

#[tokio::test]
async fn test_login_and_profile() {
    let h = harness().await;
    register(&h.server, "alice").await;

    let login = h
        .server
        .post("/api/users/login")
        .json(&json!({ "email": "ALICE@x.com", "password": "secret1" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
    let token = login.json::<Value>()["token"].as_str().unwrap().to_string();

    let profile = h
        .server
        .get("/api/users/profile")
        .authorization_bearer(&token)
        .await;
    assert_eq!(profile.status_code(), StatusCode::OK);
    let body = profile.json::<Value>();
    assert_eq!(body["username"], "alice");
    assert!(body.get("token").is_none());

    let wrong = h
        .server
        .post("/api/users/login")
        .json(&json!({ "email": "alice@x.com", "password": "nope" }))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json::<Value>()["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_credential() {
    let h = harness().await;

    let missing = h.server.get("/api/users/profile").await;
    assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json::<Value>()["code"], "UNAUTHORIZED");

    let forged = h
        .server
        .get("/api/events/my-events")
        .authorization_bearer("not.a.token")
        .await;
    assert_eq!(forged.status_code(), StatusCode::UNAUTHORIZED);

    let create = h
        .server
        .post("/api/events/create")
        .multipart(event_form("Anonymous", 3))
        .await;
    assert_eq!(create.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_create_and_fetch_event() {
    let h = harness().await;
    let token = register(&h.server, "alice").await;

    let response = h
        .server
        .post("/api/events/create")
        .authorization_bearer(&token)
        .multipart(event_form("Rust Meetup", 25))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["message"], "Event created successfully");
    assert_eq!(body["event"]["title"], "Rust Meetup");
    assert_eq!(body["event"]["maxAttendees"], 25);
    assert_eq!(body["event"]["date"], "2030-06-01T00:00:00Z");
    assert_eq!(body["event"]["attendees"], json!([]));
    let id = body["event"]["_id"].as_str().unwrap().to_string();

    let fetched = h.server.get(&format!("/api/events/{id}")).await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    let event = fetched.json::<Value>();
    assert_eq!(event["_id"], id);
    assert_eq!(event["location"], "Berlin");
    assert_eq!(event["createdBy"]["username"], "alice");
    assert_eq!(event["createdBy"]["email"], "alice@x.com");
}

#[tokio::test]
async fn test_create_accepts_json_body() {
    let h = harness().await;
    let token = register(&h.server, "alice").await;

    let response = h
        .server
        .post("/api/events/create")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "Book Club",
            "description": "Chapter 3",
            "date": "2030-07-01T19:30:00Z",
            "location": "Library",
            "maxAttendees": 8,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["event"]["maxAttendees"], 8);
}

#[tokio::test]
async fn test_create_validation_errors() {
    let h = harness().await;
    let token = register(&h.server, "alice").await;

    let missing = MultipartForm::new()
        .add_text("title", "No details")
        .add_text("maxAttendees", "3");
    let response = h
        .server
        .post("/api/events/create")
        .authorization_bearer(&token)
        .multipart(missing)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Please provide all required fields");

    let response = h
        .server
        .post("/api/events/create")
        .authorization_bearer(&token)
        .multipart(event_form("Zero seats", 0))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_capacity_beyond_integer_range_is_rejected() {
    let h = harness().await;
    let token = register(&h.server, "alice").await;

    let response = h
        .server
        .post("/api/events/create")
        .authorization_bearer(&token)
        .multipart(event_form("Stadium", 3_000_000_000))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "maxAttendees must be a positive integer");

    let id = create_event(&h.server, &token, "Stadium", 10).await;
    let response = h
        .server
        .put(&format!("/api/events/{id}"))
        .authorization_bearer(&token)
        .json(&json!({ "maxAttendees": 3_000_000_000_u64 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_image_upload_is_stored_and_served() {
    let h = harness().await;
    let token = register(&h.server, "alice").await;

    let png = b"\x89PNG\r\n\x1a\nfake".to_vec();
    let form = event_form("With poster", 10).add_part(
        "image",
        Part::bytes(png.clone())
            .file_name("poster.png")
            .mime_type("image/png"),
    );
    let response = h
        .server
        .post("/api/events/create")
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let image_url = response.json::<Value>()["event"]["imageUrl"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(image_url.starts_with("/uploads/"));
    assert!(image_url.ends_with("_poster.png"));

    let served = h.server.get(&image_url).await;
    assert_eq!(served.status_code(), StatusCode::OK);
    assert_eq!(served.as_bytes().to_vec(), png);
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let h = harness().await;
    let token = register(&h.server, "alice").await;

    let form = event_form("With a PDF", 10).add_part(
        "image",
        Part::bytes(b"%PDF-1.7".to_vec())
            .file_name("agenda.pdf")
            .mime_type("application/pdf"),
    );
    let response = h
        .server
        .post("/api/events/create")
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Only image files are allowed!");

    let all = h.server.get("/api/events/all").await.json::<Value>();
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn test_list_filters_and_my_events() {
    let h = harness().await;
    let alice = register(&h.server, "alice").await;
    let bob = register(&h.server, "bob").await;

    create_event(&h.server, &alice, "Rust Meetup", 5).await;
    create_event(&h.server, &alice, "Go Meetup", 5).await;
    create_event(&h.server, &bob, "Book Club", 5).await;

    let all = h.server.get("/api/events/all").await.json::<Value>();
    assert_eq!(all.as_array().unwrap().len(), 3);

    let meetups = h
        .server
        .get("/api/events/all")
        .add_query_param("title", "MEETUP")
        .await
        .json::<Value>();
    assert_eq!(meetups.as_array().unwrap().len(), 2);

    let on_day = h
        .server
        .get("/api/events/all")
        .add_query_param("date", "2030-06-01")
        .await
        .json::<Value>();
    assert_eq!(on_day.as_array().unwrap().len(), 3);

    let bad_date = h
        .server
        .get("/api/events/all")
        .add_query_param("date", "June 1st")
        .await;
    assert_eq!(bad_date.status_code(), StatusCode::BAD_REQUEST);

    let mine = h
        .server
        .get("/api/events/my-events")
        .authorization_bearer(&bob)
        .await
        .json::<Value>();
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["title"], "Book Club");
}

#[tokio::test]
async fn test_rsvp_scenario_until_full() {
    println!("🧪 Scenario: two seats, three guests over HTTP");
    let h = harness().await;
    let alice = register(&h.server, "alice").await;
    let bob = register(&h.server, "bob").await;
    let carol = register(&h.server, "carol").await;
    let dave = register(&h.server, "dave").await;

    let id = create_event(&h.server, &alice, "Small Dinner", 2).await;
    let rsvp = format!("/api/events/{id}/rsvp");

    let first = h.server.post(&rsvp).authorization_bearer(&bob).await;
    assert_eq!(first.status_code(), StatusCode::OK);
    assert_eq!(first.json::<Value>()["message"], "RSVP successful");

    let again = h.server.post(&rsvp).authorization_bearer(&bob).await;
    assert_eq!(again.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(again.json::<Value>()["code"], "ALREADY_REGISTERED");
    assert_eq!(again.json::<Value>()["message"], "You have already RSVP'd to this event.");

    let second = h.server.post(&rsvp).authorization_bearer(&carol).await;
    assert_eq!(second.status_code(), StatusCode::OK);
    assert_eq!(second.json::<Value>()["event"]["attendees"].as_array().unwrap().len(), 2);

    let full = h.server.post(&rsvp).authorization_bearer(&dave).await;
    assert_eq!(full.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(full.json::<Value>()["code"], "EVENT_FULL");
    assert_eq!(full.json::<Value>()["message"], "This event is fully booked.");

    let event = h.server.get(&format!("/api/events/{id}")).await.json::<Value>();
    let names: Vec<_> = event["attendees"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["bob", "carol"]);
    assert!(event["attendees"][0].get("email").is_none());

    let mine = h
        .server
        .get("/api/events/my-events")
        .authorization_bearer(&alice)
        .await
        .json::<Value>();
    assert_eq!(mine[0]["attendees"][0]["email"], "bob@x.com");

    println!("  ✅ Seats filled in order, fourth guest turned away");
}

#[tokio::test]
async fn test_update_and_delete_enforce_ownership() {
    println!("🧪 Scenario: bob tries to change alice's event");
    let h = harness().await;
    let alice = register(&h.server, "alice").await;
    let bob = register(&h.server, "bob").await;
    let id = create_event(&h.server, &alice, "Alice's Party", 4).await;
    let path = format!("/api/events/{id}");

    let delete = h.server.delete(&path).authorization_bearer(&bob).await;
    assert_eq!(delete.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        delete.json::<Value>()["message"],
        "You are not authorized to delete this event"
    );

    let update = h
        .server
        .put(&path)
        .authorization_bearer(&bob)
        .multipart(MultipartForm::new().add_text("title", "Bob's Party"))
        .await;
    assert_eq!(update.status_code(), StatusCode::FORBIDDEN);

    let still_there = h.server.get(&path).await;
    assert_eq!(still_there.status_code(), StatusCode::OK);
    assert_eq!(still_there.json::<Value>()["title"], "Alice's Party");

    let update = h
        .server
        .put(&path)
        .authorization_bearer(&alice)
        .multipart(MultipartForm::new().add_text("title", "Alice's Big Party"))
        .await;
    assert_eq!(update.status_code(), StatusCode::OK);
    let body = update.json::<Value>();
    assert_eq!(body["title"], "Alice's Big Party");
    assert_eq!(body["location"], "Berlin");

    let delete = h.server.delete(&path).authorization_bearer(&alice).await;
    assert_eq!(delete.status_code(), StatusCode::OK);
    assert_eq!(delete.json::<Value>()["message"], "Event deleted successfully");

    let gone = h.server.get(&path).await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(gone.json::<Value>()["message"], "Event not found");

    println!("  ✅ Only the owner could change it");
}

#[tokio::test]
async fn test_missing_and_malformed_ids_are_not_found() {
    let h = harness().await;
    let token = register(&h.server, "alice").await;

    let malformed = h.server.get("/api/events/not-a-uuid").await;
    assert_eq!(malformed.status_code(), StatusCode::NOT_FOUND);

    let unknown = format!("/api/events/{}/rsvp", uuid::Uuid::new_v4());
    let rsvp = h.server.post(&unknown).authorization_bearer(&token).await;
    assert_eq!(rsvp.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let h = harness().await;

    let response = h
        .server
        .get("/health")
        .add_header(
            axum::http::HeaderName::from_static("x-correlation-id"),
            axum::http::HeaderValue::from_static("6f1c1f0e-3b7a-4a53-9d6c-0d7f3c1e2a10"),
        )
        .await;
    assert_eq!(
        response.header("x-correlation-id"),
        "6f1c1f0e-3b7a-4a53-9d6c-0d7f3c1e2a10"
    );
}
