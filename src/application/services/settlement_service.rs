//! Settlement Service
//!
//! Settles the pending wagers of a completed event: captures the feed's
//! settled proposition scores onto the stored rows, runs the tiered matcher
//! over the scored rows, writes outcomes conditionally, and refreshes the
//! rollups of every strategy attached to a newly settled wager.
//!
//! An unresolved wager is left pending and retried on a later run once more
//! data may be available; it is never guessed.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::rollup_service::RollupService;
use crate::domain::entities::odds_row::OddsRow;
use crate::domain::entities::wager::Wager;
use crate::domain::errors::SettlementError;
use crate::domain::repositories::game_catalog::GameCatalogClient;
use crate::domain::repositories::odds_feed::OddsFeedClient;
use crate::domain::services::settlement::{derive_outcome, match_wager, MatchResult};
use crate::persistence::odds_repository::OddsRepository;
use crate::persistence::wager_repository::WagerRepository;

/// Result of `SettleEventWagers` for one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementReport {
    pub event_id: String,
    pub resolved: usize,
    pub unresolved: usize,
    /// Conditional settle found the wager already settled by an overlapping
    /// run; nothing was rewritten.
    pub already_settled: usize,
    pub errors: Vec<String>,
}

const MAX_ERROR_SAMPLES: usize = 10;

pub struct SettlementService {
    feed: Arc<dyn OddsFeedClient>,
    catalog: Arc<dyn GameCatalogClient>,
    odds: Arc<OddsRepository>,
    wagers: Arc<WagerRepository>,
    rollups: Arc<RollupService>,
}

impl SettlementService {
    pub fn new(
        feed: Arc<dyn OddsFeedClient>,
        catalog: Arc<dyn GameCatalogClient>,
        odds: Arc<OddsRepository>,
        wagers: Arc<WagerRepository>,
        rollups: Arc<RollupService>,
    ) -> Self {
        Self {
            feed,
            catalog,
            odds,
            wagers,
            rollups,
        }
    }

    /// Settle every pending wager on a completed event.
    pub async fn settle_event(&self, event_id: &str) -> Result<SettlementReport, SettlementError> {
        let event = self
            .catalog
            .fetch_event(event_id)
            .await
            .map_err(|source| SettlementError::Catalog {
                event_id: event_id.to_string(),
                source,
            })?;
        if !event.is_final() {
            return Err(SettlementError::EventNotFinal {
                event_id: event_id.to_string(),
                status: event.status,
            });
        }

        self.capture_results(event_id).await?;

        let rows: Vec<OddsRow> = self
            .odds
            .scored_rows_for_event(event_id)
            .await?
            .into_iter()
            .map(|r| r.into_domain())
            .collect();

        let pending = self.wagers.pending_for_event(event_id).await?;
        info!(
            event_id = %event_id,
            scored_rows = rows.len(),
            pending_wagers = pending.len(),
            "Settling event"
        );

        let mut report = SettlementReport {
            event_id: event_id.to_string(),
            ..Default::default()
        };
        let mut settled_wager_ids = Vec::new();

        for record in pending {
            let wager_id = record.id.clone();
            let wager: Wager = match record.into_domain() {
                Ok(w) => w,
                Err(reason) => {
                    warn!(wager_id = %wager_id, "Unreadable wager record: {}", reason);
                    push_sample(&mut report.errors, format!("{}: {}", wager_id, reason));
                    continue;
                }
            };

            match self.settle_wager(&wager, &rows).await {
                Ok(SettleAttempt::Settled) => {
                    report.resolved += 1;
                    settled_wager_ids.push(wager.id.clone());
                }
                Ok(SettleAttempt::LostRace) => report.already_settled += 1,
                Ok(SettleAttempt::Unresolved(reason)) => {
                    debug!(
                        wager_id = %wager.id,
                        odd_id = %wager.odd_id,
                        "Wager left pending: {}", reason
                    );
                    report.unresolved += 1;
                }
                Err(e) => {
                    push_sample(&mut report.errors, format!("{}: {}", wager.id, e));
                }
            }
        }

        self.refresh_strategies(&settled_wager_ids, &mut report).await;

        info!(
            event_id = %event_id,
            resolved = report.resolved,
            unresolved = report.unresolved,
            already_settled = report.already_settled,
            errors = report.errors.len(),
            "Settlement complete"
        );
        Ok(report)
    }

    /// Stamp the feed's settled proposition scores onto the stored rows.
    async fn capture_results(&self, event_id: &str) -> Result<(), SettlementError> {
        let results = self
            .feed
            .fetch_event_results(event_id)
            .await
            .map_err(|source| SettlementError::Results {
                event_id: event_id.to_string(),
                source,
            })?;

        for (odd_id, score) in &results.scores {
            let touched = self
                .odds
                .record_settled_score(event_id, odd_id, *score, Utc::now())
                .await?;
            if touched == 0 {
                debug!(
                    event_id = %event_id,
                    odd_id = %odd_id,
                    "Result for a proposition we never ingested"
                );
            }
        }
        Ok(())
    }

    async fn settle_wager(
        &self,
        wager: &Wager,
        rows: &[OddsRow],
    ) -> Result<SettleAttempt, SettlementError> {
        let (row, tier) = match match_wager(wager, rows) {
            MatchResult::Matched { row, tier } => (row, tier),
            MatchResult::Unresolved(reason) => {
                return Ok(SettleAttempt::Unresolved(reason.to_string()))
            }
        };

        let Some(outcome) = derive_outcome(wager, row) else {
            return Ok(SettleAttempt::Unresolved(
                "matched row has no derivable outcome".to_string(),
            ));
        };

        debug!(
            wager_id = %wager.id,
            matched_odd_id = %row.odd_id,
            tier = %tier,
            outcome = %outcome,
            "Wager matched"
        );

        if self.wagers.settle(&wager.id, outcome, Utc::now()).await? {
            Ok(SettleAttempt::Settled)
        } else {
            Ok(SettleAttempt::LostRace)
        }
    }

    /// Recompute the rollup of every strategy linked to a settled wager.
    async fn refresh_strategies(&self, wager_ids: &[String], report: &mut SettlementReport) {
        let mut strategy_ids = BTreeSet::new();
        for wager_id in wager_ids {
            match self.rollups.strategies_for_wager(wager_id).await {
                Ok(ids) => strategy_ids.extend(ids),
                Err(e) => push_sample(&mut report.errors, format!("{}: {}", wager_id, e)),
            }
        }

        for strategy_id in strategy_ids {
            if let Err(e) = self.rollups.recompute(&strategy_id).await {
                warn!(strategy_id = %strategy_id, "Rollup refresh failed: {}", e);
                push_sample(&mut report.errors, format!("rollup {}: {}", strategy_id, e));
            }
        }
    }
}

enum SettleAttempt {
    Settled,
    LostRace,
    Unresolved(String),
}

fn push_sample(samples: &mut Vec<String>, message: String) {
    if samples.len() < MAX_ERROR_SAMPLES {
        samples.push(message);
    }
}
