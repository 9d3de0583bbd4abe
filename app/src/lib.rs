//! Evently - an event management service.
//!
//! Users register, sign in, publish events with a capacity and an optional
//! image, and RSVP to each other's events. The seat count is never exceeded
//! and nobody holds two seats at one event, no matter how many RSVPs race.
//!
//! # Architecture
//!
//! ```text
//!   HTTP (axum)                 api::*  handlers, extractors, forms
//!        │
//!        ▼
//!   services::EventService      projections, logging
//!   evently_auth::AuthService   register / login / resolve identity
//!        │
//!        ▼
//!   store::EventStore::send     load ─▶ EventReducer ─▶ apply effects
//!        │                      (one critical section per event)
//!        ▼
//!   memory maps  |  PostgreSQL (SELECT ... FOR UPDATE)
//! ```
//!
//! Every change to an event is an
//! [`EventAction`](evently_core::aggregate::EventAction) decided by the pure
//! [`EventReducer`](evently_core::aggregate::EventReducer). The store runs
//! the reducer while it holds the event's lock, so the check for a free seat
//! and the write that takes it cannot be split by another request.
//!
//! # Quick start
//!
//! ```bash
//! # In-memory stores, random signing secret
//! cargo run -p evently
//!
//! # PostgreSQL
//! STORE_BACKEND=postgres DATABASE_URL=postgres://localhost/evently \
//!   JWT_SECRET=change-me cargo run -p evently
//! ```

pub mod api;
pub mod config;
pub mod server;
pub mod services;
pub mod store;
pub mod uploads;

pub use config::Config;
pub use server::{AppState, build_router};
