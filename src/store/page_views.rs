//! Page view rows and aggregate queries.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::Row;
use uuid::Uuid;

use crate::store::{Store, StoreResult};

/// A page view ready for insertion. `viewed_at` falls back to now when
/// the client did not send a timestamp.
#[derive(Debug, Clone, Default)]
pub struct NewPageView {
    pub page: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub session_id: Option<String>,
    pub viewed_at: Option<DateTime<Utc>>,
}

/// One entry of the top-pages ranking.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopPage {
    pub page: String,
    pub views: i64,
}

/// Aggregate traffic statistics over a trailing window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewStats {
    pub total_views: i64,
    pub unique_visitors: i64,
    pub top_pages: Vec<TopPage>,
    pub period: String,
}

impl Store {
    /// Record a single page view and return its id.
    pub async fn insert_page_view(&self, view: &NewPageView) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let viewed_at = view.viewed_at.unwrap_or_else(Utc::now);

        sqlx::query(
            "INSERT INTO page_views \
             (id, page, ip_address, user_agent, referrer, utm_source, utm_medium, \
              utm_campaign, utm_term, utm_content, session_id, viewed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&id)
        .bind(&view.page)
        .bind(&view.ip_address)
        .bind(&view.user_agent)
        .bind(&view.referrer)
        .bind(&view.utm_source)
        .bind(&view.utm_medium)
        .bind(&view.utm_campaign)
        .bind(&view.utm_term)
        .bind(&view.utm_content)
        .bind(&view.session_id)
        .bind(viewed_at)
        .execute(self.pool())
        .await?;

        Ok(id)
    }

    /// Traffic statistics for the last `days` days, optionally restricted
    /// to a single page path.
    pub async fn page_view_stats(
        &self,
        days: u32,
        page: Option<&str>,
    ) -> StoreResult<PageViewStats> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));

        let mut total_sql =
            String::from("SELECT COUNT(*) AS n FROM page_views WHERE viewed_at >= ?1");
        if page.is_some() {
            total_sql.push_str(" AND page = ?2");
        }
        let mut total_query = sqlx::query(&total_sql).bind(cutoff);
        if let Some(p) = page {
            total_query = total_query.bind(p);
        }
        let total_views: i64 = total_query.fetch_one(self.pool()).await?.try_get("n")?;

        let mut unique_sql = String::from(
            "SELECT COUNT(DISTINCT ip_address) AS n FROM page_views WHERE viewed_at >= ?1",
        );
        if page.is_some() {
            unique_sql.push_str(" AND page = ?2");
        }
        let mut unique_query = sqlx::query(&unique_sql).bind(cutoff);
        if let Some(p) = page {
            unique_query = unique_query.bind(p);
        }
        let unique_visitors: i64 = unique_query.fetch_one(self.pool()).await?.try_get("n")?;

        let mut top_sql = String::from(
            "SELECT page, COUNT(*) AS views FROM page_views WHERE viewed_at >= ?1",
        );
        if page.is_some() {
            top_sql.push_str(" AND page = ?2");
        }
        top_sql.push_str(" GROUP BY page ORDER BY views DESC LIMIT 10");
        let mut top_query = sqlx::query(&top_sql).bind(cutoff);
        if let Some(p) = page {
            top_query = top_query.bind(p);
        }
        let top_pages = top_query
            .fetch_all(self.pool())
            .await?
            .into_iter()
            .map(|row| {
                Ok(TopPage {
                    page: row.try_get("page")?,
                    views: row.try_get("views")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(PageViewStats {
            total_views,
            unique_visitors,
            top_pages,
            period: format!("{} days", days),
        })
    }

    /// Total page view rows. Used by the admin status view.
    pub async fn count_page_views(&self) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM page_views")
            .fetch_one(self.pool())
            .await?;
        Ok(row.try_get("n")?)
    }
}
