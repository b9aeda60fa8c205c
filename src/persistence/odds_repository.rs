//! Odds store repository.
//!
//! Owns the dual-table write semantics: upsert-by-key into `odds_current`
//! and insert-if-absent into `odds_opening`. Both rely on the store-native
//! `UNIQUE(event_id, odd_id, line)` index plus `ON CONFLICT`, never on a
//! read-then-write check, so concurrent ingestion cycles for the same event
//! cannot reintroduce duplicates.

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use super::models::OddsRowRecord;
use super::{DatabaseError, DbPool};
use crate::domain::entities::odds_row::OddsRow;

pub struct OddsRepository {
    pool: DbPool,
}

impl OddsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Upsert a row into the current store. Existing rows for the key have
    /// their price and timestamp columns overwritten; the settled score is
    /// left untouched (results capture owns it).
    pub async fn upsert_current(&self, row: &OddsRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO odds_current (
                event_id, odd_id, line, market_name, bet_type_id, side_id,
                draftkings_price, fanduel_price, betmgm_price, caesars_price,
                classification, settled_score, fetched_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL, ?12, ?13)
            ON CONFLICT(event_id, odd_id, line) DO UPDATE SET
                market_name = excluded.market_name,
                bet_type_id = excluded.bet_type_id,
                side_id = excluded.side_id,
                draftkings_price = excluded.draftkings_price,
                fanduel_price = excluded.fanduel_price,
                betmgm_price = excluded.betmgm_price,
                caesars_price = excluded.caesars_price,
                classification = excluded.classification,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&row.event_id)
        .bind(&row.odd_id)
        .bind(row.line.as_storage())
        .bind(&row.market_name)
        .bind(&row.bet_type_id)
        .bind(&row.side_id)
        .bind(row.prices.draftkings)
        .bind(row.prices.fanduel)
        .bind(row.prices.betmgm)
        .bind(row.prices.caesars)
        .bind(row.classification.as_str())
        .bind(row.fetched_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                event_id = %row.event_id,
                odd_id = %row.odd_id,
                line = %row.line,
                "Failed to upsert current odds row: {}", e
            );
            DatabaseError::from_sqlx(e, &row_context("odds_current", row))
        })?;

        Ok(())
    }

    /// Offer a row to the opening store. The first observed row per key is
    /// permanent; a conflict is success, reported as `false` (not inserted).
    pub async fn insert_opening(&self, row: &OddsRow) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO odds_opening (
                event_id, odd_id, line, market_name, bet_type_id, side_id,
                draftkings_price, fanduel_price, betmgm_price, caesars_price,
                classification, fetched_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(event_id, odd_id, line) DO NOTHING
            "#,
        )
        .bind(&row.event_id)
        .bind(&row.odd_id)
        .bind(row.line.as_storage())
        .bind(&row.market_name)
        .bind(&row.bet_type_id)
        .bind(&row.side_id)
        .bind(row.prices.draftkings)
        .bind(row.prices.fanduel)
        .bind(row.prices.betmgm)
        .bind(row.prices.caesars)
        .bind(row.classification.as_str())
        .bind(row.fetched_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                event_id = %row.event_id,
                odd_id = %row.odd_id,
                line = %row.line,
                "Failed to insert opening odds row: {}", e
            );
            DatabaseError::from_sqlx(e, &row_context("odds_opening", row))
        })?;

        let inserted = result.rows_affected() == 1;
        if !inserted {
            debug!(
                event_id = %row.event_id,
                odd_id = %row.odd_id,
                line = %row.line,
                "Opening row already captured, skipping"
            );
        }
        Ok(inserted)
    }

    /// All current-store rows for an event.
    pub async fn current_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<OddsRowRecord>, DatabaseError> {
        sqlx::query_as::<_, OddsRowRecord>(
            "SELECT * FROM odds_current WHERE event_id = ?1 ORDER BY odd_id, line",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load current odds for {}: {}", event_id, e);
            DatabaseError::from_sqlx(e, "odds_current select")
        })
    }

    /// All opening-store rows for an event.
    pub async fn opening_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<OddsRowRecord>, DatabaseError> {
        sqlx::query_as::<_, OddsRowRecord>(
            r#"
            SELECT
                id, event_id, odd_id, line, market_name, bet_type_id, side_id,
                draftkings_price, fanduel_price, betmgm_price, caesars_price,
                classification, NULL AS settled_score, fetched_at,
                fetched_at AS updated_at
            FROM odds_opening
            WHERE event_id = ?1
            ORDER BY odd_id, line
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load opening odds for {}: {}", event_id, e);
            DatabaseError::from_sqlx(e, "odds_opening select")
        })
    }

    /// Current-store rows for an event that carry a settled score. These are
    /// the settlement matcher's candidate set.
    pub async fn scored_rows_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<OddsRowRecord>, DatabaseError> {
        sqlx::query_as::<_, OddsRowRecord>(
            r#"
            SELECT * FROM odds_current
            WHERE event_id = ?1 AND settled_score IS NOT NULL
            ORDER BY odd_id, line
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load scored odds for {}: {}", event_id, e);
            DatabaseError::from_sqlx(e, "odds_current scored select")
        })
    }

    /// Stamp a proposition's settled score onto every line of that
    /// proposition in the current store. Returns the number of rows touched.
    pub async fn record_settled_score(
        &self,
        event_id: &str,
        odd_id: &str,
        score: f64,
        now: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE odds_current
            SET settled_score = ?1, updated_at = ?2
            WHERE event_id = ?3 AND odd_id = ?4
            "#,
        )
        .bind(score)
        .bind(now)
        .bind(event_id)
        .bind(odd_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                event_id = %event_id,
                odd_id = %odd_id,
                "Failed to record settled score: {}", e
            );
            DatabaseError::from_sqlx(e, "odds_current settled_score update")
        })?;

        Ok(result.rows_affected())
    }
}

fn row_context(table: &str, row: &OddsRow) -> String {
    format!(
        "{}({}, {}, {})",
        table, row.event_id, row.odd_id, row.line
    )
}
