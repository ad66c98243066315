//! Database schema initialization.
//!
//! Creates tables and indexes on startup. All statements are idempotent
//! so restarting against an existing database is safe.

use sqlx::SqlitePool;

/// Interests offered on the signup form. Seeded once, referenced by name.
const DEFAULT_INTERESTS: &[(&str, &str)] = &[
    ("AI Fundamentals", "Basic AI and machine learning concepts"),
    ("ChatGPT Mastery", "Advanced ChatGPT techniques and prompting"),
    ("Business Applications", "Using AI for business and productivity"),
    ("Content Creation", "AI-powered content and copywriting"),
    ("Automation", "AI workflow automation and tools"),
    ("Programming", "AI-assisted coding and development"),
];

/// Segmentation tags with display colors for the admin views.
const DEFAULT_TAGS: &[(&str, &str, &str)] = &[
    ("Early Bird", "Early course subscribers", "#10b981"),
    ("VIP", "VIP subscribers", "#f59e0b"),
    ("Regular", "Regular subscribers", "#3b82f6"),
    ("Engaged", "Highly engaged users", "#8b5cf6"),
    ("Converted", "Purchased the course", "#ef4444"),
];

/// Initialize the database schema with all required tables and indexes.
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;

    // Subscribers
    //*************
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS subscribers (
        id text NOT NULL,
        email text NOT NULL,
        first_name text,
        last_name text,
        company text,
        experience_level text,
        interests text NOT NULL DEFAULT '[]',
        source text NOT NULL,
        status text NOT NULL DEFAULT 'active',
        ip_address text,
        user_agent text,
        referral_source text,
        referral_medium text,
        referral_campaign text,
        signup_date text NOT NULL,
        last_engagement text,
        created_at text NOT NULL,
        updated_at text NOT NULL,
        PRIMARY KEY(id)
    )",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_subscribers_email ON subscribers(email)")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_subscribers_status ON subscribers(status)")
        .execute(&mut *tx)
        .await?;

    // Page views
    //************
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS page_views (
        id text NOT NULL,
        page text NOT NULL,
        ip_address text,
        user_agent text,
        referrer text,
        utm_source text,
        utm_medium text,
        utm_campaign text,
        utm_term text,
        utm_content text,
        session_id text,
        viewed_at text NOT NULL,
        PRIMARY KEY(id)
    )",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_page_views_viewed_at ON page_views(viewed_at)")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_page_views_page ON page_views(page)")
        .execute(&mut *tx)
        .await?;

    // Interests and tags
    //********************
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS interests (
        name text NOT NULL,
        description text,
        PRIMARY KEY(name)
    )",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tags (
        name text NOT NULL,
        description text,
        color text,
        PRIMARY KEY(name)
    )",
    )
    .execute(&mut *tx)
    .await?;

    for (name, description) in DEFAULT_INTERESTS {
        sqlx::query("INSERT OR IGNORE INTO interests (name, description) VALUES (?1, ?2)")
            .bind(name)
            .bind(description)
            .execute(&mut *tx)
            .await?;
    }

    for (name, description, color) in DEFAULT_TAGS {
        sqlx::query("INSERT OR IGNORE INTO tags (name, description, color) VALUES (?1, ?2, ?3)")
            .bind(name)
            .bind(description)
            .bind(color)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(())
}
