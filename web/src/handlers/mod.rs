//! HTTP handlers shared by every Evently server.

pub mod health;

pub use health::{ReadinessProbe, health_check, readiness_check};
