//! Subscription subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/subscribe
//!     → types.rs (wire payload, name splitting)
//!     → validate.rs (field checks, defaults, -> NewSubscriber)
//!     → handler.rs (upsert: create / reactivate / confirm)
//!     → store (unique email index is the source of truth)
//! ```
//!
//! # Design Decisions
//! - The existence lookup is a fast path only; concurrent signups for
//!   the same email are resolved by the unique index, and the losing
//!   insert is folded into the same already-subscribed path
//! - Duplicate submissions for an active email are not an error under
//!   the default policy; a config switch turns them into 409s
//! - Emails are compared byte for byte, no case normalization

pub mod handler;
pub mod types;
pub mod validate;

pub use types::SubscribeRequest;
