//! Rollup Service
//!
//! Recomputes a strategy's cached aggregate from scratch on every call. The
//! scan reads the links join, never the previous rollup row, so redundant
//! invocations are harmless. Recomputations for the same strategy are
//! serialized through a per-strategy mutex; different strategies proceed in
//! parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::entities::strategy::StrategyRollup;
use crate::domain::entities::wager::WagerStatus;
use crate::domain::errors::RollupError;
use crate::domain::services::rollup::{compute_rollup, RollupInput};
use crate::persistence::strategy_repository::StrategyRepository;
use crate::persistence::DatabaseError;

pub struct RollupService {
    strategies: Arc<StrategyRepository>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RollupService {
    pub fn new(strategies: Arc<StrategyRepository>) -> Self {
        Self {
            strategies,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Recompute and persist the rollup for a strategy.
    pub async fn recompute(&self, strategy_id: &str) -> Result<StrategyRollup, RollupError> {
        let lock = self.lock_for(strategy_id).await;
        let _guard = lock.lock().await;

        let records = self.strategies.linked_wagers(strategy_id).await?;
        let inputs: Vec<RollupInput> = records
            .iter()
            .map(|record| {
                Ok(RollupInput {
                    status: WagerStatus::parse(&record.status)
                        .map_err(DatabaseError::Query)?,
                    stake: record.stake,
                    potential_payout: record.potential_payout,
                })
            })
            .collect::<Result<_, DatabaseError>>()?;

        let rollup = compute_rollup(strategy_id, &inputs, Utc::now());
        self.strategies.upsert_rollup(&rollup).await?;

        debug!(
            strategy_id = %strategy_id,
            total = rollup.total_bets,
            settled = rollup.settled_bets,
            "Rollup recomputed"
        );
        Ok(rollup)
    }

    /// Attribute a wager to a strategy and refresh the rollup.
    pub async fn link_wager(
        &self,
        strategy_id: &str,
        wager_id: &str,
    ) -> Result<StrategyRollup, RollupError> {
        let created = self.strategies.link(strategy_id, wager_id).await?;
        if created {
            info!(strategy_id = %strategy_id, wager_id = %wager_id, "Wager linked");
        }
        self.recompute(strategy_id).await
    }

    /// Remove a wager attribution and refresh the rollup.
    pub async fn unlink_wager(
        &self,
        strategy_id: &str,
        wager_id: &str,
    ) -> Result<StrategyRollup, RollupError> {
        let removed = self.strategies.unlink(strategy_id, wager_id).await?;
        if removed {
            info!(strategy_id = %strategy_id, wager_id = %wager_id, "Wager unlinked");
        }
        self.recompute(strategy_id).await
    }

    /// Strategies attached to a wager (used by settlement to find rollups
    /// needing a refresh).
    pub async fn strategies_for_wager(
        &self,
        wager_id: &str,
    ) -> Result<Vec<String>, RollupError> {
        Ok(self.strategies.strategies_for_wager(wager_id).await?)
    }

    /// Cached rollup, if previously computed.
    pub async fn get_cached(
        &self,
        strategy_id: &str,
    ) -> Result<Option<StrategyRollup>, RollupError> {
        Ok(self
            .strategies
            .get_rollup(strategy_id)
            .await?
            .map(|r| r.into_domain()))
    }

    async fn lock_for(&self, strategy_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(strategy_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::wager::{BetType, WagerSide};
    use crate::domain::value_objects::line::Line;
    use crate::persistence::init_memory_database;
    use crate::persistence::models::CreateWager;
    use crate::persistence::wager_repository::WagerRepository;

    async fn setup() -> (Arc<RollupService>, Arc<WagerRepository>) {
        let pool = init_memory_database().await.unwrap();
        let strategies = Arc::new(StrategyRepository::new(pool.clone()));
        let wagers = Arc::new(WagerRepository::new(pool));
        (Arc::new(RollupService::new(strategies)), wagers)
    }

    async fn seed_wager(wagers: &WagerRepository, id: &str, status: Option<WagerStatus>) {
        wagers
            .create(CreateWager {
                id: id.to_string(),
                user_id: "u1".to_string(),
                event_id: "evt-1".to_string(),
                odd_id: "ml-home".to_string(),
                line: Line::Main,
                bet_type: BetType::Moneyline,
                side: WagerSide::Home,
                stake: 100.0,
                price: -110.0,
                potential_payout: 190.0,
            })
            .await
            .unwrap();
        if let Some(outcome) = status {
            wagers.settle(id, outcome, Utc::now()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_recompute_scans_links_fresh() {
        let (service, wagers) = setup().await;
        seed_wager(&wagers, "w1", Some(WagerStatus::Won)).await;
        seed_wager(&wagers, "w2", None).await;

        let rollup = service.link_wager("s1", "w1").await.unwrap();
        assert_eq!(rollup.total_bets, 1);

        let rollup = service.link_wager("s1", "w2").await.unwrap();
        assert_eq!(rollup.total_bets, 2);
        assert_eq!(rollup.settled_bets, 1);
        assert_eq!(rollup.pending_bets, 1);

        let rollup = service.unlink_wager("s1", "w2").await.unwrap();
        assert_eq!(rollup.total_bets, 1);
    }

    #[tokio::test]
    async fn test_redundant_recompute_is_stable() {
        let (service, wagers) = setup().await;
        seed_wager(&wagers, "w1", Some(WagerStatus::Won)).await;
        service.link_wager("s1", "w1").await.unwrap();

        let a = service.recompute("s1").await.unwrap();
        let b = service.recompute("s1").await.unwrap();
        assert_eq!(a.total_bets, b.total_bets);
        assert_eq!(a.winning_bets, b.winning_bets);
        assert_eq!(a.win_rate, b.win_rate);
        assert_eq!(a.roi_percentage, b.roi_percentage);
    }

    #[tokio::test]
    async fn test_rollup_for_unknown_strategy_is_empty() {
        let (service, _) = setup().await;
        let rollup = service.recompute("nobody").await.unwrap();
        assert_eq!(rollup.total_bets, 0);
        assert_eq!(rollup.win_rate, 0.0);
    }
}
