//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack, routing table)
//!     → security::rate_limit (subscription gate)
//!     → request.rs (client IP extraction, header helpers)
//!     → domain handlers (subscriptions, analytics, health, admin)
//!     → response.rs (wire envelopes)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer, RuntimeSettings};
