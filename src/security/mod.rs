//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (fixed-window check per client + route)
//!     → allowed: pass to handler, annotate X-RateLimit headers
//!     → rejected: 429 with resetTime, no handler invocation
//! ```
//!
//! # Design Decisions
//! - Process-local state only; no cross-instance coordination
//! - The limiter itself never fails; a failure to classify the client
//!   falls back to a shared "anonymous" bucket rather than an error
//! - Expired windows are swept periodically to bound memory

pub mod rate_limit;

pub use rate_limit::{RateLimitDecision, RateLimitKey, RateLimiter};
