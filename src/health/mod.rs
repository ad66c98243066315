//! Health probe subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health/db
//!     → store ping (SELECT 1)
//!     → subscriber count
//!     → 200 healthy report / 500 unhealthy report
//!
//! HEAD /health/db
//!     → 200 unconditionally (process liveness, no database access)
//! ```
//!
//! # Design Decisions
//! - The probe exercises a real query, not just a pooled connection,
//!   so a corrupt or locked database file shows up as unhealthy
//! - Raw database errors are only echoed outside production

pub mod handler;

pub use handler::{database_health, database_health_head};
