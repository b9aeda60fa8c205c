//! Game Catalog Client Trait
//!
//! Interface to the external event catalog: lifecycle status and scheduled
//! start time for the ingestion cutoff check, and the final score once a
//! game completes. The cutoff check reads through this interface on every
//! call so it always reflects the latest status.

use async_trait::async_trait;

use crate::domain::entities::event::Event;

/// Common result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur talking to the event catalog
#[derive(Debug, Clone)]
pub enum CatalogError {
    /// Event id unknown to the catalog
    NotFound(String),
    /// Request exceeded the configured deadline
    Timeout(String),
    /// Transport-level failure
    Network(String),
    /// Non-success HTTP status from the catalog
    Status(u16, String),
    /// Response body did not match the expected shape
    Decode(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound(id) => write!(f, "Event not found in catalog: {}", id),
            CatalogError::Timeout(msg) => write!(f, "Catalog timeout: {}", msg),
            CatalogError::Network(msg) => write!(f, "Catalog network error: {}", msg),
            CatalogError::Status(code, msg) => {
                write!(f, "Catalog returned status {}: {}", code, msg)
            }
            CatalogError::Decode(msg) => write!(f, "Catalog decode error: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Event catalog interface
#[async_trait]
pub trait GameCatalogClient: Send + Sync {
    /// Fetch the current lifecycle snapshot for an event.
    async fn fetch_event(&self, event_id: &str) -> CatalogResult<Event>;
}
