//! Odds Feed Client Trait
//!
//! Defines the `OddsFeedClient` trait, the common interface to the upstream
//! per-event odds feed. The ingestion and settlement services depend on this
//! abstraction only, which keeps the pipeline testable with mock feeds and
//! independent of the concrete HTTP provider.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Common result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors that can occur talking to the odds feed
#[derive(Debug, Clone)]
pub enum FeedError {
    /// Request exceeded the configured deadline
    Timeout(String),
    /// Transport-level failure
    Network(String),
    /// Non-success HTTP status from the feed
    Status(u16, String),
    /// Response body did not match the expected shape
    Decode(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Timeout(msg) => write!(f, "Feed timeout: {}", msg),
            FeedError::Network(msg) => write!(f, "Feed network error: {}", msg),
            FeedError::Status(code, msg) => write!(f, "Feed returned status {}: {}", code, msg),
            FeedError::Decode(msg) => write!(f, "Feed decode error: {}", msg),
        }
    }
}

impl std::error::Error for FeedError {}

/// One alternate-line entry inside a bookmaker's quote.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAlternate {
    /// Raw line value; may arrive as a number, a numeric string, null or the
    /// literal string "null" depending on the feed revision.
    pub line: Option<Value>,
    pub price: Option<f64>,
}

/// One bookmaker's quote for a proposition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBookQuote {
    pub price: Option<f64>,
    #[serde(default)]
    pub alternates: Vec<RawAlternate>,
}

/// Market metadata for one proposition key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMarket {
    pub market_name: Option<String>,
    pub bet_type_id: Option<String>,
    pub side_id: Option<String>,
    pub draftkings: Option<RawBookQuote>,
    pub fanduel: Option<RawBookQuote>,
    pub betmgm: Option<RawBookQuote>,
    pub caesars: Option<RawBookQuote>,
}

impl RawMarket {
    /// Bookmaker column order is fixed so canonicalization is deterministic.
    pub fn books(&self) -> [(&'static str, Option<&RawBookQuote>); 4] {
        [
            ("draftkings", self.draftkings.as_ref()),
            ("fanduel", self.fanduel.as_ref()),
            ("betmgm", self.betmgm.as_ref()),
            ("caesars", self.caesars.as_ref()),
        ]
    }
}

/// Per-event payload: proposition key -> market metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEventOdds {
    pub event_id: String,
    #[serde(default)]
    pub odds: HashMap<String, RawMarket>,
}

/// Settled per-proposition outcomes for a completed event.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEventResults {
    pub event_id: String,
    /// proposition key -> determined numeric outcome
    #[serde(default)]
    pub scores: HashMap<String, f64>,
}

/// Upstream odds feed interface
#[async_trait]
pub trait OddsFeedClient: Send + Sync {
    /// Fetch the current market payload for a single event.
    async fn fetch_event_odds(&self, event_id: &str) -> FeedResult<RawEventOdds>;

    /// Fetch market payloads for the league's upcoming events inside the
    /// given lookahead window.
    async fn fetch_upcoming(
        &self,
        league: &str,
        lookahead_hours: i64,
        include_alternates: bool,
    ) -> FeedResult<Vec<RawEventOdds>>;

    /// Fetch settled proposition scores for a completed event.
    async fn fetch_event_results(&self, event_id: &str) -> FeedResult<RawEventResults>;
}
