//! Wager repository.
//!
//! The settlement matcher is the only writer of wager status. The settle
//! update is conditional on the row still being pending, which serializes
//! concurrent settlement attempts for the same wager at the store level: the
//! loser of the race affects zero rows and must not treat that as success.

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use super::models::{CreateWager, WagerRecord};
use super::{DatabaseError, DbPool};
use crate::domain::entities::wager::WagerStatus;

pub struct WagerRepository {
    pool: DbPool,
}

impl WagerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record a wager. Creation normally happens in the marketplace layer;
    /// this write path keeps the table owned here and feeds the tests.
    pub async fn create(&self, wager: CreateWager) -> Result<WagerRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, WagerRecord>(
            r#"
            INSERT INTO wagers (
                id, user_id, event_id, odd_id, line, bet_type, side,
                stake, price, potential_payout, status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'pending', ?11, ?11)
            RETURNING *
            "#,
        )
        .bind(&wager.id)
        .bind(&wager.user_id)
        .bind(&wager.event_id)
        .bind(&wager.odd_id)
        .bind(wager.line.as_storage())
        .bind(wager.bet_type.as_str())
        .bind(wager.side.as_str())
        .bind(wager.stake)
        .bind(wager.price)
        .bind(wager.potential_payout)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create wager {}: {}", wager.id, e);
            DatabaseError::from_sqlx(e, &format!("wagers({})", wager.id))
        })?;

        debug!("Created wager {} on event {}", record.id, record.event_id);
        Ok(record)
    }

    /// Get wager by ID
    pub async fn get(&self, id: &str) -> Result<Option<WagerRecord>, DatabaseError> {
        sqlx::query_as::<_, WagerRecord>("SELECT * FROM wagers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get wager {}: {}", id, e);
                DatabaseError::from_sqlx(e, "wagers select")
            })
    }

    /// All pending wagers referencing an event.
    pub async fn pending_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<WagerRecord>, DatabaseError> {
        sqlx::query_as::<_, WagerRecord>(
            "SELECT * FROM wagers WHERE event_id = ?1 AND status = 'pending' ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load pending wagers for {}: {}", event_id, e);
            DatabaseError::from_sqlx(e, "wagers pending select")
        })
    }

    /// Conditionally settle a wager. Returns `false` when the wager was no
    /// longer pending (a concurrent run settled it first); the caller must
    /// not write a second outcome.
    pub async fn settle(
        &self,
        wager_id: &str,
        outcome: WagerStatus,
        settled_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        debug_assert!(outcome.is_settled());

        let result = sqlx::query(
            r#"
            UPDATE wagers
            SET status = ?1, settled_at = ?2, updated_at = ?2
            WHERE id = ?3 AND status = 'pending'
            "#,
        )
        .bind(outcome.as_str())
        .bind(settled_at)
        .bind(wager_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to settle wager {}: {}", wager_id, e);
            DatabaseError::from_sqlx(e, &format!("wagers settle({})", wager_id))
        })?;

        Ok(result.rows_affected() == 1)
    }
}
