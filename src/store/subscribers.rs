//! Subscriber rows and queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::store::{Store, StoreError, StoreResult};

/// Lifecycle state of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Active,
    Unsubscribed,
}

impl SubscriberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberStatus::Active => "active",
            SubscriberStatus::Unsubscribed => "unsubscribed",
        }
    }

    fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "active" => Ok(SubscriberStatus::Active),
            "unsubscribed" => Ok(SubscriberStatus::Unsubscribed),
            other => Err(StoreError::CorruptRow(format!(
                "unknown subscriber status: {}",
                other
            ))),
        }
    }
}

/// Self-reported experience level from the signup form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperienceLevel {
    CompleteBeginner,
    SomeAiTechExperience,
    ExperiencedProfessional,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::CompleteBeginner => "COMPLETE_BEGINNER",
            ExperienceLevel::SomeAiTechExperience => "SOME_AI_TECH_EXPERIENCE",
            ExperienceLevel::ExperiencedProfessional => "EXPERIENCED_PROFESSIONAL",
        }
    }

    fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "COMPLETE_BEGINNER" => Ok(ExperienceLevel::CompleteBeginner),
            "SOME_AI_TECH_EXPERIENCE" => Ok(ExperienceLevel::SomeAiTechExperience),
            "EXPERIENCED_PROFESSIONAL" => Ok(ExperienceLevel::ExperiencedProfessional),
            other => Err(StoreError::CorruptRow(format!(
                "unknown experience level: {}",
                other
            ))),
        }
    }
}

/// A validated subscriber ready for insertion.
#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub interests: Vec<String>,
    pub source: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referral_source: Option<String>,
    pub referral_medium: Option<String>,
    pub referral_campaign: Option<String>,
}

/// A subscriber row as stored.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub interests: Vec<String>,
    pub source: String,
    pub status: SubscriberStatus,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referral_source: Option<String>,
    pub referral_medium: Option<String>,
    pub referral_campaign: Option<String>,
    pub signup_date: DateTime<Utc>,
    pub last_engagement: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client attribution captured from analytics events.
#[derive(Debug, Clone, Default)]
pub struct Attribution {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

const SUBSCRIBER_COLUMNS: &str = "id, email, first_name, last_name, company, experience_level, \
     interests, source, status, ip_address, user_agent, referral_source, referral_medium, \
     referral_campaign, signup_date, last_engagement, created_at, updated_at";

fn subscriber_from_row(row: SqliteRow) -> Result<Subscriber, StoreError> {
    let status: String = row.try_get("status")?;
    let experience_level: Option<String> = row.try_get("experience_level")?;
    let interests_json: String = row.try_get("interests")?;

    let interests: Vec<String> = serde_json::from_str(&interests_json)
        .map_err(|e| StoreError::CorruptRow(format!("bad interests json: {}", e)))?;

    Ok(Subscriber {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        company: row.try_get("company")?,
        experience_level: experience_level
            .as_deref()
            .map(ExperienceLevel::parse)
            .transpose()?,
        interests,
        source: row.try_get("source")?,
        status: SubscriberStatus::parse(&status)?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
        referral_source: row.try_get("referral_source")?,
        referral_medium: row.try_get("referral_medium")?,
        referral_campaign: row.try_get("referral_campaign")?,
        signup_date: row.try_get("signup_date")?,
        last_engagement: row.try_get("last_engagement")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Store {
    /// Look up a subscriber by exact email match.
    pub async fn find_subscriber_by_email(&self, email: &str) -> StoreResult<Option<Subscriber>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscribers WHERE email = ?1",
            SUBSCRIBER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        row.map(subscriber_from_row).transpose()
    }

    /// Insert a new active subscriber.
    ///
    /// Returns [`StoreError::DuplicateEmail`] if the email already exists,
    /// which callers use to resolve insert races against concurrent signups.
    pub async fn insert_subscriber(&self, new: &NewSubscriber) -> StoreResult<Subscriber> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let interests_json = serde_json::to_string(&new.interests)
            .map_err(|e| StoreError::CorruptRow(format!("bad interests json: {}", e)))?;

        sqlx::query(
            "INSERT INTO subscribers \
             (id, email, first_name, last_name, company, experience_level, interests, \
              source, status, ip_address, user_agent, referral_source, referral_medium, \
              referral_campaign, signup_date, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )
        .bind(&id)
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.company)
        .bind(new.experience_level.map(|e| e.as_str()))
        .bind(&interests_json)
        .bind(&new.source)
        .bind(SubscriberStatus::Active.as_str())
        .bind(&new.ip_address)
        .bind(&new.user_agent)
        .bind(&new.referral_source)
        .bind(&new.referral_medium)
        .bind(&new.referral_campaign)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(Subscriber {
            id,
            email: new.email.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            company: new.company.clone(),
            experience_level: new.experience_level,
            interests: new.interests.clone(),
            source: new.source.clone(),
            status: SubscriberStatus::Active,
            ip_address: new.ip_address.clone(),
            user_agent: new.user_agent.clone(),
            referral_source: new.referral_source.clone(),
            referral_medium: new.referral_medium.clone(),
            referral_campaign: new.referral_campaign.clone(),
            signup_date: now,
            last_engagement: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Flip an unsubscribed subscriber back to active, refreshing the
    /// signup date and attribution source.
    pub async fn reactivate_subscriber(
        &self,
        email: &str,
        source: &str,
    ) -> StoreResult<Subscriber> {
        let now = Utc::now();

        sqlx::query(
            "UPDATE subscribers \
             SET status = ?1, source = ?2, signup_date = ?3, updated_at = ?4 \
             WHERE email = ?5",
        )
        .bind(SubscriberStatus::Active.as_str())
        .bind(source)
        .bind(now)
        .bind(now)
        .bind(email)
        .execute(self.pool())
        .await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM subscribers WHERE email = ?1",
            SUBSCRIBER_COLUMNS
        ))
        .bind(email)
        .fetch_one(self.pool())
        .await?;

        subscriber_from_row(row)
    }

    /// Count subscribers currently in the active state.
    pub async fn count_active_subscribers(&self) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM subscribers WHERE status = 'active'")
            .fetch_one(self.pool())
            .await?;
        Ok(row.try_get("n")?)
    }

    /// Count all subscriber rows regardless of state.
    pub async fn count_subscribers(&self) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM subscribers")
            .fetch_one(self.pool())
            .await?;
        Ok(row.try_get("n")?)
    }

    /// Attach analytics attribution to an existing subscriber and bump
    /// their engagement timestamp. A no-op for unknown emails.
    pub async fn record_engagement(&self, email: &str, attr: &Attribution) -> StoreResult<()> {
        let now = Utc::now();

        sqlx::query(
            "UPDATE subscribers \
             SET ip_address = ?1, user_agent = ?2, referral_source = ?3, \
                 referral_medium = ?4, referral_campaign = ?5, \
                 last_engagement = ?6, updated_at = ?7 \
             WHERE email = ?8",
        )
        .bind(&attr.ip_address)
        .bind(&attr.user_agent)
        .bind(&attr.utm_source)
        .bind(&attr.utm_medium)
        .bind(&attr.utm_campaign)
        .bind(now)
        .bind(now)
        .bind(email)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Most recently signed up subscribers, newest first. Used by the
    /// admin views and the CLI.
    pub async fn recent_subscribers(&self, limit: u32) -> StoreResult<Vec<Subscriber>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM subscribers ORDER BY signup_date DESC LIMIT ?1",
            SUBSCRIBER_COLUMNS
        ))
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(subscriber_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(email: &str) -> NewSubscriber {
        NewSubscriber {
            email: email.to_string(),
            first_name: Some("Jane".to_string()),
            last_name: Some("Smith".to_string()),
            company: None,
            experience_level: Some(ExperienceLevel::CompleteBeginner),
            interests: vec!["Automation".to_string()],
            source: "landing_page".to_string(),
            ip_address: Some("203.0.113.1".to_string()),
            user_agent: None,
            referral_source: Some("newsletter".to_string()),
            referral_medium: None,
            referral_campaign: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_roundtrip() {
        let store = Store::open_in_memory().await.unwrap();

        let created = store.insert_subscriber(&sample("jane@example.com")).await.unwrap();
        assert_eq!(created.status, SubscriberStatus::Active);

        let found = store
            .find_subscriber_by_email("jane@example.com")
            .await
            .unwrap()
            .expect("subscriber should exist");

        assert_eq!(found.id, created.id);
        assert_eq!(found.first_name.as_deref(), Some("Jane"));
        assert_eq!(
            found.experience_level,
            Some(ExperienceLevel::CompleteBeginner)
        );
        assert_eq!(found.interests, vec!["Automation".to_string()]);
        assert_eq!(found.ip_address.as_deref(), Some("203.0.113.1"));
        assert_eq!(found.referral_source.as_deref(), Some("newsletter"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_detected() {
        let store = Store::open_in_memory().await.unwrap();

        store.insert_subscriber(&sample("dup@example.com")).await.unwrap();
        let err = store
            .insert_subscriber(&sample("dup@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = Store::open_in_memory().await.unwrap();

        store.insert_subscriber(&sample("case@example.com")).await.unwrap();
        let found = store
            .find_subscriber_by_email("CASE@example.com")
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_reactivate_restores_active_status() {
        let store = Store::open_in_memory().await.unwrap();

        store.insert_subscriber(&sample("back@example.com")).await.unwrap();
        sqlx::query("UPDATE subscribers SET status = 'unsubscribed' WHERE email = ?1")
            .bind("back@example.com")
            .execute(store.pool())
            .await
            .unwrap();
        assert_eq!(store.count_active_subscribers().await.unwrap(), 0);

        let updated = store
            .reactivate_subscriber("back@example.com", "newsletter")
            .await
            .unwrap();

        assert_eq!(updated.status, SubscriberStatus::Active);
        assert_eq!(updated.source, "newsletter");
        assert_eq!(store.count_active_subscribers().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_engagement_sets_attribution() {
        let store = Store::open_in_memory().await.unwrap();

        store.insert_subscriber(&sample("engaged@example.com")).await.unwrap();
        store
            .record_engagement(
                "engaged@example.com",
                &Attribution {
                    ip_address: Some("203.0.113.9".to_string()),
                    utm_source: Some("newsletter".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let found = store
            .find_subscriber_by_email("engaged@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(found.last_engagement.is_some());
    }
}
