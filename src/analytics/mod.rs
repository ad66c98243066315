//! Analytics subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/analytics (event bag)
//!     → events.rs (tagged union parse, UTM extraction)
//!     → handler.rs (closed dispatch per event kind)
//!     → store page_views (best effort; failures logged, not surfaced)
//!
//! POST /api/analytics/page-view (dedicated beacon)
//!     → handler.rs → store page_views (failures surfaced as 500)
//!
//! GET /api/analytics/page-view?days&page
//!     → store aggregate queries
//! ```
//!
//! # Design Decisions
//! - Event kinds are a closed enum; unknown names are accepted, logged
//!   and dropped so an outdated frontend never sees errors
//! - The generic ingest endpoint never fails on store errors; losing an
//!   analytics row is cheaper than breaking the page
//! - The dedicated beacon endpoint does surface store failures, since
//!   its caller checks the response

pub mod events;
pub mod handler;

pub use events::{AnalyticsEvent, UtmParams};
