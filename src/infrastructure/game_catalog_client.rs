//! HTTP game catalog client.
//!
//! Fetches event lifecycle snapshots. Callers re-read through this client on
//! every cutoff check, so no caching happens here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::entities::event::{Event, EventStatus};
use crate::domain::repositories::game_catalog::{CatalogError, CatalogResult, GameCatalogClient};

/// Catalog connection configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

pub struct HttpGameCatalogClient {
    config: CatalogConfig,
    client: Client,
}

/// Catalog wire format for one game
#[derive(Debug, Deserialize)]
struct CatalogEvent {
    id: String,
    home_team: String,
    away_team: String,
    starts_at: DateTime<Utc>,
    status: String,
    home_score: Option<i64>,
    away_score: Option<i64>,
}

impl HttpGameCatalogClient {
    pub fn new(config: CatalogConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Network(format!("build http client: {}", e)))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl GameCatalogClient for HttpGameCatalogClient {
    async fn fetch_event(&self, event_id: &str) -> CatalogResult<Event> {
        let url = format!("{}/v1/games/{}", self.config.base_url, event_id);
        debug!("Catalog request: {}", url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout(e.to_string())
                } else {
                    CatalogError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(event_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status(status.as_u16(), body));
        }

        let wire = response
            .json::<CatalogEvent>()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))?;

        Ok(Event {
            status: EventStatus::parse(&wire.status).map_err(CatalogError::Decode)?,
            id: wire.id,
            home_team: wire.home_team,
            away_team: wire.away_team,
            starts_at: wire.starts_at,
            home_score: wire.home_score,
            away_score: wire.away_score,
        })
    }
}
