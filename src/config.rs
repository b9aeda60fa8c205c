//! Pipeline configuration, loaded from environment variables with sensible
//! defaults for local development.

/// Configuration for the ingestion/settlement pipeline and its admin API
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub bind_address: String,

    // Upstream odds feed
    pub feed_base_url: String,
    pub feed_api_key: String,
    pub feed_timeout_seconds: u64,

    // Event catalog
    pub catalog_base_url: String,
    pub catalog_api_key: String,
    pub catalog_timeout_seconds: u64,

    // Ingestion cycle
    pub league: String,
    pub lookahead_hours: i64,
    pub include_alternate_lines: bool,
    pub ingest_concurrency: usize,

    // Admin API rate limiting
    pub admin_requests_per_minute: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            database_url: "sqlite://data/linekeeper.db".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            feed_base_url: "https://api.sportsgameodds.example".to_string(),
            feed_api_key: String::new(),
            feed_timeout_seconds: 30,
            catalog_base_url: "https://api.gamecatalog.example".to_string(),
            catalog_api_key: String::new(),
            catalog_timeout_seconds: 15,
            league: "MLB".to_string(),
            lookahead_hours: 48,
            include_alternate_lines: true,
            ingest_concurrency: 8,
            admin_requests_per_minute: 60,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> PipelineConfig {
        let mut config = PipelineConfig::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            config.bind_address = addr;
        }
        if let Ok(url) = std::env::var("ODDS_FEED_BASE_URL") {
            config.feed_base_url = url;
        }
        if let Ok(key) = std::env::var("ODDS_FEED_API_KEY") {
            config.feed_api_key = key;
        }
        if let Ok(timeout) = std::env::var("ODDS_FEED_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(value) if value > 0 => config.feed_timeout_seconds = value,
                _ => tracing::warn!(
                    "Invalid ODDS_FEED_TIMEOUT_SECONDS '{}', using default: {}",
                    timeout,
                    config.feed_timeout_seconds
                ),
            }
        }
        if let Ok(url) = std::env::var("GAME_CATALOG_BASE_URL") {
            config.catalog_base_url = url;
        }
        if let Ok(key) = std::env::var("GAME_CATALOG_API_KEY") {
            config.catalog_api_key = key;
        }
        if let Ok(timeout) = std::env::var("GAME_CATALOG_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(value) if value > 0 => config.catalog_timeout_seconds = value,
                _ => tracing::warn!(
                    "Invalid GAME_CATALOG_TIMEOUT_SECONDS '{}', using default: {}",
                    timeout,
                    config.catalog_timeout_seconds
                ),
            }
        }
        if let Ok(league) = std::env::var("LEAGUE") {
            config.league = league;
        }
        if let Ok(hours) = std::env::var("LOOKAHEAD_HOURS") {
            if let Ok(value) = hours.parse::<i64>() {
                if value > 0 {
                    config.lookahead_hours = value;
                }
            }
        }
        if let Ok(flag) = std::env::var("INCLUDE_ALTERNATE_LINES") {
            config.include_alternate_lines = flag.to_lowercase() == "true" || flag == "1";
        }
        if let Ok(concurrency) = std::env::var("INGEST_CONCURRENCY") {
            if let Ok(value) = concurrency.parse::<usize>() {
                if value > 0 {
                    config.ingest_concurrency = value;
                }
            }
        }
        if let Ok(rpm) = std::env::var("ADMIN_REQUESTS_PER_MINUTE") {
            if let Ok(value) = rpm.parse::<u32>() {
                if value > 0 {
                    config.admin_requests_per_minute = value;
                }
            }
        }

        config
    }
}
