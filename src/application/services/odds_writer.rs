//! Dual-Table Writer
//!
//! Takes one event's canonical rows and performs the idempotent dual write:
//! upsert into the current store, insert-if-absent into the opening store.
//! The game-started cutoff is re-evaluated on every call against the event
//! snapshot passed in, so it always reflects the latest catalog status.
//!
//! Error handling per row:
//! - conflicts are expected under at-least-once delivery: swallowed, counted;
//! - constraint violations are fatal to that row only, logged with the full
//!   key, and the rest of the batch continues;
//! - anything else surfaces to the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::domain::entities::event::Event;
use crate::domain::entities::odds_row::{MarketClass, OddsRow};
use crate::persistence::odds_repository::OddsRepository;
use crate::persistence::DatabaseError;

/// Per-call write accounting, reported for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStats {
    pub attempted: usize,
    pub written_current: usize,
    pub written_opening: usize,
    pub main_lines: usize,
    pub alternate_lines: usize,
    pub player_props: usize,
    pub conflicts_ignored: usize,
    pub failed_rows: usize,
}

/// Result of offering one event's rows to the stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Cutoff hit: the event has started and no current-store write was
    /// attempted for it.
    Skipped { reason: String },
    Written(WriteStats),
}

pub struct OddsWriter {
    odds: Arc<OddsRepository>,
}

impl OddsWriter {
    pub fn new(odds: Arc<OddsRepository>) -> Self {
        Self { odds }
    }

    /// Write one event's canonical rows to both stores.
    pub async fn write_event(
        &self,
        event: &Event,
        rows: &[OddsRow],
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome, DatabaseError> {
        if event.has_started(now) {
            let reason = format!(
                "game started (status {}, starts_at {})",
                event.status, event.starts_at
            );
            info!(event_id = %event.id, "Skipping ingestion: {}", reason);
            return Ok(WriteOutcome::Skipped { reason });
        }

        // Independent stores with independent conflict semantics; write them
        // concurrently.
        let (current, opening) = tokio::join!(
            self.write_current(rows),
            self.write_opening(rows)
        );
        let (written_current, current_conflicts, current_failures) = current?;
        let (written_opening, opening_conflicts, opening_failures) = opening?;

        let mut stats = WriteStats {
            attempted: rows.len(),
            written_current,
            written_opening,
            conflicts_ignored: current_conflicts + opening_conflicts,
            failed_rows: current_failures + opening_failures,
            ..Default::default()
        };
        for row in rows {
            if row.classification == MarketClass::PlayerProp {
                stats.player_props += 1;
            } else if row.line.is_main() {
                stats.main_lines += 1;
            } else {
                stats.alternate_lines += 1;
            }
        }

        info!(
            event_id = %event.id,
            attempted = stats.attempted,
            written_current = stats.written_current,
            written_opening = stats.written_opening,
            "Odds written"
        );
        Ok(WriteOutcome::Written(stats))
    }

    async fn write_current(
        &self,
        rows: &[OddsRow],
    ) -> Result<(usize, usize, usize), DatabaseError> {
        let mut written = 0;
        let mut conflicts = 0;
        let mut failures = 0;
        for row in rows {
            match self.odds.upsert_current(row).await {
                Ok(()) => written += 1,
                Err(e) if e.is_conflict() => conflicts += 1,
                Err(e) if e.is_constraint() => {
                    error!(
                        event_id = %row.event_id,
                        odd_id = %row.odd_id,
                        line = %row.line,
                        "Current-store row rejected: {}", e
                    );
                    failures += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok((written, conflicts, failures))
    }

    async fn write_opening(
        &self,
        rows: &[OddsRow],
    ) -> Result<(usize, usize, usize), DatabaseError> {
        let mut inserted = 0;
        let mut conflicts = 0;
        let mut failures = 0;
        for row in rows {
            match self.odds.insert_opening(row).await {
                Ok(true) => inserted += 1,
                // key already captured; insert-once contract satisfied
                Ok(false) | Err(DatabaseError::Conflict { .. }) => conflicts += 1,
                Err(e) if e.is_constraint() => {
                    error!(
                        event_id = %row.event_id,
                        odd_id = %row.odd_id,
                        line = %row.line,
                        "Opening-store row rejected: {}", e
                    );
                    failures += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok((inserted, conflicts, failures))
    }
}
