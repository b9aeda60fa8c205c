//! Operation-level error types for the pipeline core.
//!
//! Each exposed operation has its own error enum so callers can tell a
//! skipped event from a broken store from a feed outage without sniffing
//! message text.

use thiserror::Error;

use crate::domain::entities::event::EventStatus;
use crate::domain::repositories::game_catalog::CatalogError;
use crate::domain::repositories::odds_feed::FeedError;
use crate::persistence::DatabaseError;

/// Errors from `IngestEventOdds` / the batch ingestion cycle.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("odds feed unavailable for event {event_id}: {source}")]
    Feed {
        event_id: String,
        source: FeedError,
    },

    #[error("event catalog unavailable for event {event_id}: {source}")]
    Catalog {
        event_id: String,
        source: CatalogError,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Errors from `SettleEventWagers`.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("event {event_id} is not final (status {status})")]
    EventNotFinal {
        event_id: String,
        status: EventStatus,
    },

    #[error("event catalog unavailable for event {event_id}: {source}")]
    Catalog {
        event_id: String,
        source: CatalogError,
    },

    #[error("results unavailable for event {event_id}: {source}")]
    Results {
        event_id: String,
        source: FeedError,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Errors from `RecomputeStrategyRollup` and link mutations.
#[derive(Debug, Error)]
pub enum RollupError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
}
