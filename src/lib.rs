//! Waitlist API Library

pub mod admin;
pub mod analytics;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod store;
pub mod subscriptions;

pub use config::ApiConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::Store;
