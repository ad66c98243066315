use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

/// Signup payload. Every field is optional on the wire; the server
/// validates and reports missing fields.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriberSummary {
    pub id: String,
    pub email: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeOutcome {
    pub success: bool,
    pub message: String,
    pub subscriber: SubscriberSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSubscribers {
    pub total_subscribers: i64,
}

/// Page view beacon payload.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewReceipt {
    pub success: bool,
    pub page_view_id: String,
}

pub struct WaitlistClient {
    client: Client,
    base_url: String,
}

impl WaitlistClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Sign up an email address, expecting a success response.
    pub async fn subscribe(
        &self,
        req: &SubscribeRequest,
    ) -> Result<SubscribeOutcome, Box<dyn std::error::Error>> {
        let resp = self.subscribe_raw(req).await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("API returned error status {}: {}", status, text).into());
        }

        match serde_json::from_str::<SubscribeOutcome>(&text) {
            Ok(outcome) => Ok(outcome),
            Err(e) => Err(e.into()),
        }
    }

    /// Sign up an email address, returning the raw response so callers
    /// can inspect validation, duplicate and rate limit statuses.
    pub async fn subscribe_raw(
        &self,
        req: &SubscribeRequest,
    ) -> Result<Response, reqwest::Error> {
        self.client
            .post(format!("{}/api/subscribe", self.base_url))
            .json(req)
            .send()
            .await
    }

    /// Number of active subscribers.
    pub async fn total_subscribers(&self) -> Result<i64, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}/api/subscribe", self.base_url))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("API returned error status {}: {}", status, text).into());
        }

        let totals: TotalSubscribers = serde_json::from_str(&text)?;
        Ok(totals.total_subscribers)
    }

    /// Record one page view.
    pub async fn track_page_view(
        &self,
        view: &PageView,
    ) -> Result<PageViewReceipt, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .post(format!("{}/api/analytics/page-view", self.base_url))
            .json(view)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("API returned error status {}: {}", status, text).into());
        }

        let receipt: PageViewReceipt = serde_json::from_str(&text)?;
        Ok(receipt)
    }

    /// Status of the database health probe.
    pub async fn health(&self) -> Result<StatusCode, reqwest::Error> {
        let resp = self
            .client
            .get(format!("{}/health/db", self.base_url))
            .send()
            .await?;
        Ok(resp.status())
    }
}
