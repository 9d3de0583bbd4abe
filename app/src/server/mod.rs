//! HTTP server for Evently.
//!
//! - Application state built from configuration
//! - Router with every endpoint and the shared middleware stack
//! - Graceful shutdown on Ctrl+C or SIGTERM

pub mod routes;
pub mod shutdown;
pub mod state;

pub use routes::build_router;
pub use shutdown::shutdown_signal;
pub use state::AppState;
