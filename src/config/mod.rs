//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ApiConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of runtime settings
//!     → handlers observe new limits on the next request
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only runtime-tunable settings (rate limit, duplicate policy) are
//!   hot-swapped; listener and database changes require a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::ApiConfig;
pub use schema::DuplicatePolicy;
pub use schema::Environment;
pub use schema::RateLimitConfig;
pub use schema::SubscriptionConfig;
