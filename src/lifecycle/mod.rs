//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! SIGINT/SIGTERM (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → broadcast to server loop, sweeper, config applier
//!     → axum drains in-flight requests, tasks exit, pool closes
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans out to every long-running task; tasks
//!   never poll a flag
//! - A second signal while draining exits immediately

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
