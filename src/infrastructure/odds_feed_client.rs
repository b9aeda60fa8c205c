//! HTTP odds feed client.
//!
//! Talks to the upstream odds API with bounded timeouts. A timeout or
//! non-success status skips the event's cycle; it is never partially
//! applied, and retry policy belongs to the invoker.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::domain::repositories::odds_feed::{
    FeedError, FeedResult, OddsFeedClient, RawEventOdds, RawEventResults,
};

/// Odds feed connection configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

pub struct HttpOddsFeedClient {
    config: FeedConfig,
    client: Client,
}

impl HttpOddsFeedClient {
    pub fn new(config: FeedConfig) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::Network(format!("build http client: {}", e)))?;
        Ok(Self { config, client })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> FeedResult<T> {
        debug!("Feed request: {}", url);
        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status(status.as_u16(), truncate(&body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))
    }
}

#[async_trait]
impl OddsFeedClient for HttpOddsFeedClient {
    async fn fetch_event_odds(&self, event_id: &str) -> FeedResult<RawEventOdds> {
        let url = format!("{}/v2/events/{}/odds", self.config.base_url, event_id);
        self.get_json(url).await
    }

    async fn fetch_upcoming(
        &self,
        league: &str,
        lookahead_hours: i64,
        include_alternates: bool,
    ) -> FeedResult<Vec<RawEventOdds>> {
        let url = format!(
            "{}/v2/events?league={}&lookahead_hours={}&include_alternates={}",
            self.config.base_url, league, lookahead_hours, include_alternates
        );
        self.get_json(url).await
    }

    async fn fetch_event_results(&self, event_id: &str) -> FeedResult<RawEventResults> {
        let url = format!("{}/v2/events/{}/results", self.config.base_url, event_id);
        self.get_json(url).await
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> FeedError {
    if e.is_timeout() {
        FeedError::Timeout(e.to_string())
    } else {
        FeedError::Network(e.to_string())
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let head: String = body.chars().take(MAX).collect();
        format!("{}...", head)
    } else {
        body.to_string()
    }
}
