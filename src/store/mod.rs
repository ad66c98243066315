//! Persistence subsystem backed by SQLite.
//!
//! # Responsibilities
//! - Own the connection pool and schema lifecycle
//! - Map subscriber and page view rows to domain types
//! - Translate driver errors into domain errors (unique violations
//!   become [`StoreError::DuplicateEmail`])
//!
//! # Design Decisions
//! - The pool is cheap to clone; handlers hold a `Store` by value
//! - WAL journal mode so reads do not block the write path
//! - Schema creation is idempotent (`CREATE TABLE IF NOT EXISTS`) and
//!   runs inside a single transaction at startup

pub mod page_views;
pub mod schema;
pub mod subscribers;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

pub use page_views::{NewPageView, PageViewStats, TopPage};
pub use subscribers::{Attribution, ExperienceLevel, NewSubscriber, Subscriber, SubscriberStatus};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert hit the unique index on `subscribers.email`.
    #[error("email address is already registered")]
    DuplicateEmail,

    /// Row decode produced a value outside the domain model.
    #[error("corrupt row: {0}")]
    CorruptRow(String),

    /// Any other driver-level failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Fold a driver error into the domain, detecting unique violations.
    fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Database(err)
    }
}

/// Handle to the SQLite database.
///
/// Cloning is cheap; all clones share one pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists.
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> StoreResult<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        schema::init_db(&pool).await?;

        Ok(Self { pool })
    }

    /// Open an in-memory database. Unit tests use this.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let opts = SqliteConnectOptions::new().in_memory(true);

        // A single connection, otherwise each pool checkout would see a
        // fresh empty in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        schema::init_db(&pool).await?;

        Ok(Self { pool })
    }

    /// Cheapest possible liveness probe.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
