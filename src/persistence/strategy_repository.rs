//! Strategy link and rollup repository.
//!
//! Links are the ground truth the rollup derives from; the rollup table is a
//! cache and is always written whole (upsert by strategy id).

use tracing::{debug, error};

use super::models::{StrategyRollupRecord, WagerRecord};
use super::{DatabaseError, DbPool};
use crate::domain::entities::strategy::StrategyRollup;

pub struct StrategyRepository {
    pool: DbPool,
}

impl StrategyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Attribute a wager to a strategy. Returns `false` when the link
    /// already existed (conflict on the unique pair is success here).
    pub async fn link(&self, strategy_id: &str, wager_id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO strategy_links (strategy_id, wager_id)
            VALUES (?1, ?2)
            ON CONFLICT(strategy_id, wager_id) DO NOTHING
            "#,
        )
        .bind(strategy_id)
        .bind(wager_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to link wager {} to strategy {}: {}",
                wager_id, strategy_id, e
            );
            DatabaseError::from_sqlx(e, &format!("strategy_links({}, {})", strategy_id, wager_id))
        })?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove a wager attribution. Returns `false` when no link existed.
    pub async fn unlink(&self, strategy_id: &str, wager_id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "DELETE FROM strategy_links WHERE strategy_id = ?1 AND wager_id = ?2",
        )
        .bind(strategy_id)
        .bind(wager_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to unlink wager {} from strategy {}: {}",
                wager_id, strategy_id, e
            );
            DatabaseError::from_sqlx(e, "strategy_links delete")
        })?;

        Ok(result.rows_affected() == 1)
    }

    /// Strategies a wager is attributed to; these need a rollup refresh when
    /// the wager settles.
    pub async fn strategies_for_wager(
        &self,
        wager_id: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        sqlx::query_scalar::<_, String>(
            "SELECT strategy_id FROM strategy_links WHERE wager_id = ?1 ORDER BY strategy_id",
        )
        .bind(wager_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load strategies for wager {}: {}", wager_id, e);
            DatabaseError::from_sqlx(e, "strategy_links by wager select")
        })
    }

    /// Every wager linked to the strategy, joined to its current status.
    /// This is the full replay the rollup recomputes from.
    pub async fn linked_wagers(
        &self,
        strategy_id: &str,
    ) -> Result<Vec<WagerRecord>, DatabaseError> {
        sqlx::query_as::<_, WagerRecord>(
            r#"
            SELECT w.*
            FROM strategy_links sl
            JOIN wagers w ON w.id = sl.wager_id
            WHERE sl.strategy_id = ?1
            ORDER BY w.id
            "#,
        )
        .bind(strategy_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load linked wagers for {}: {}", strategy_id, e);
            DatabaseError::from_sqlx(e, "strategy_links join select")
        })
    }

    /// Persist a freshly computed rollup, replacing any previous aggregate.
    pub async fn upsert_rollup(&self, rollup: &StrategyRollup) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO strategy_rollups (
                strategy_id, total_bets, settled_bets, pending_bets,
                winning_bets, losing_bets, push_bets, win_rate,
                roi_percentage, last_calculated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(strategy_id) DO UPDATE SET
                total_bets = excluded.total_bets,
                settled_bets = excluded.settled_bets,
                pending_bets = excluded.pending_bets,
                winning_bets = excluded.winning_bets,
                losing_bets = excluded.losing_bets,
                push_bets = excluded.push_bets,
                win_rate = excluded.win_rate,
                roi_percentage = excluded.roi_percentage,
                last_calculated_at = excluded.last_calculated_at
            "#,
        )
        .bind(&rollup.strategy_id)
        .bind(rollup.total_bets)
        .bind(rollup.settled_bets)
        .bind(rollup.pending_bets)
        .bind(rollup.winning_bets)
        .bind(rollup.losing_bets)
        .bind(rollup.push_bets)
        .bind(rollup.win_rate)
        .bind(rollup.roi_percentage)
        .bind(rollup.last_calculated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to upsert rollup for {}: {}", rollup.strategy_id, e);
            DatabaseError::from_sqlx(e, &format!("strategy_rollups({})", rollup.strategy_id))
        })?;

        debug!("Persisted rollup for strategy {}", rollup.strategy_id);
        Ok(())
    }

    /// Fetch the cached rollup, if one has been computed.
    pub async fn get_rollup(
        &self,
        strategy_id: &str,
    ) -> Result<Option<StrategyRollupRecord>, DatabaseError> {
        sqlx::query_as::<_, StrategyRollupRecord>(
            "SELECT * FROM strategy_rollups WHERE strategy_id = ?1",
        )
        .bind(strategy_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get rollup for {}: {}", strategy_id, e);
            DatabaseError::from_sqlx(e, "strategy_rollups select")
        })
    }
}
