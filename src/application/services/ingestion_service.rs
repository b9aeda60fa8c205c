//! Ingestion Service
//!
//! Orchestrates one ingestion cycle: catalog snapshot, feed fetch,
//! canonicalization, dual-table write. Events are independent of each other,
//! so the batch path runs them with bounded concurrency and folds per-event
//! failures into the summary instead of aborting the run.

use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::odds_writer::{OddsWriter, WriteOutcome};
use crate::domain::entities::event::Event;
use crate::domain::errors::IngestionError;
use crate::domain::repositories::game_catalog::GameCatalogClient;
use crate::domain::repositories::odds_feed::{OddsFeedClient, RawEventOdds};
use crate::domain::services::canonicalizer::canonicalize;

/// Result of `IngestEventOdds` for one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub event_id: String,
    pub attempted: usize,
    pub written_current: usize,
    pub written_opening: usize,
    pub main_lines: usize,
    pub alternate_lines: usize,
    pub player_props: usize,
    pub conflicts_ignored: usize,
    pub failed_rows: usize,
    pub dropped_markets: usize,
    pub skipped_reason: Option<String>,
}

/// Summary of one batch cycle over the league's upcoming events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchIngestSummary {
    pub events_seen: usize,
    pub events_ingested: usize,
    pub events_skipped: usize,
    pub events_failed: usize,
    pub rows_written_current: usize,
    pub rows_written_opening: usize,
    pub error_samples: Vec<String>,
}

const MAX_ERROR_SAMPLES: usize = 10;

pub struct IngestionService {
    feed: Arc<dyn OddsFeedClient>,
    catalog: Arc<dyn GameCatalogClient>,
    writer: Arc<OddsWriter>,
    league: String,
    lookahead_hours: i64,
    include_alternate_lines: bool,
    concurrency: usize,
}

impl IngestionService {
    pub fn new(
        feed: Arc<dyn OddsFeedClient>,
        catalog: Arc<dyn GameCatalogClient>,
        writer: Arc<OddsWriter>,
        league: String,
        lookahead_hours: i64,
        include_alternate_lines: bool,
        concurrency: usize,
    ) -> Self {
        Self {
            feed,
            catalog,
            writer,
            league,
            lookahead_hours,
            include_alternate_lines,
            concurrency: concurrency.max(1),
        }
    }

    /// Ingest current odds for a single event.
    pub async fn ingest_event(&self, event_id: &str) -> Result<IngestReport, IngestionError> {
        let event = self
            .catalog
            .fetch_event(event_id)
            .await
            .map_err(|source| IngestionError::Catalog {
                event_id: event_id.to_string(),
                source,
            })?;

        // Early cutoff saves the feed call; the writer re-checks regardless.
        if event.has_started(Utc::now()) {
            return Ok(IngestReport {
                event_id: event_id.to_string(),
                skipped_reason: Some(format!(
                    "game started (status {}, starts_at {})",
                    event.status, event.starts_at
                )),
                ..Default::default()
            });
        }

        let raw = self
            .feed
            .fetch_event_odds(event_id)
            .await
            .map_err(|source| IngestionError::Feed {
                event_id: event_id.to_string(),
                source,
            })?;

        self.ingest_prefetched(&event, &raw).await
    }

    /// Ingest every upcoming event the feed reports for the league.
    pub async fn ingest_upcoming(&self) -> BatchIngestSummary {
        let mut summary = BatchIngestSummary::default();

        let payloads = match self
            .feed
            .fetch_upcoming(&self.league, self.lookahead_hours, self.include_alternate_lines)
            .await
        {
            Ok(p) => p,
            Err(e) => {
                warn!("Upcoming odds fetch failed, nothing to ingest: {}", e);
                summary.error_samples.push(e.to_string());
                return summary;
            }
        };
        summary.events_seen = payloads.len();
        info!(
            league = %self.league,
            events = summary.events_seen,
            "Starting ingestion cycle"
        );

        let results: Vec<Result<IngestReport, IngestionError>> = stream::iter(payloads)
            .map(|raw| async move {
                let event = self
                    .catalog
                    .fetch_event(&raw.event_id)
                    .await
                    .map_err(|source| IngestionError::Catalog {
                        event_id: raw.event_id.clone(),
                        source,
                    })?;
                self.ingest_prefetched(&event, &raw).await
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for result in results {
            match result {
                Ok(report) if report.skipped_reason.is_some() => summary.events_skipped += 1,
                Ok(report) => {
                    summary.events_ingested += 1;
                    summary.rows_written_current += report.written_current;
                    summary.rows_written_opening += report.written_opening;
                }
                Err(e) => {
                    summary.events_failed += 1;
                    if summary.error_samples.len() < MAX_ERROR_SAMPLES {
                        summary.error_samples.push(e.to_string());
                    }
                }
            }
        }

        info!(
            ingested = summary.events_ingested,
            skipped = summary.events_skipped,
            failed = summary.events_failed,
            rows_current = summary.rows_written_current,
            rows_opening = summary.rows_written_opening,
            "Ingestion cycle complete"
        );
        summary
    }

    /// Canonicalize and write an already-fetched payload.
    async fn ingest_prefetched(
        &self,
        event: &Event,
        raw: &RawEventOdds,
    ) -> Result<IngestReport, IngestionError> {
        let batch = canonicalize(raw, Utc::now());
        for dropped in &batch.dropped {
            warn!(
                event_id = %event.id,
                odd_id = %dropped.odd_id,
                "Dropped market during canonicalization: {}",
                dropped.reason
            );
        }

        let outcome = self
            .writer
            .write_event(event, &batch.rows, Utc::now())
            .await?;

        Ok(match outcome {
            WriteOutcome::Skipped { reason } => IngestReport {
                event_id: event.id.clone(),
                dropped_markets: batch.dropped.len(),
                skipped_reason: Some(reason),
                ..Default::default()
            },
            WriteOutcome::Written(stats) => IngestReport {
                event_id: event.id.clone(),
                attempted: stats.attempted,
                written_current: stats.written_current,
                written_opening: stats.written_opening,
                main_lines: stats.main_lines,
                alternate_lines: stats.alternate_lines,
                player_props: stats.player_props,
                conflicts_ignored: stats.conflicts_ignored,
                failed_rows: stats.failed_rows,
                dropped_markets: batch.dropped.len(),
                skipped_reason: None,
            },
        })
    }
}
