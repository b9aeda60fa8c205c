//! Persistence Layer
//!
//! Database persistence for the odds stores, wagers, strategy links and
//! rollups. Uses SQLite for local storage with async operations via sqlx.
//!
//! # Database Schema
//!
//! ## odds_current
//! Latest-known odds snapshot, writable until the event starts. One row per
//! `(event_id, odd_id, line)`; re-ingestion overwrites price and timestamp
//! columns in place. `line` is stored as TEXT NOT NULL with `''` standing in
//! for the main line, because SQLite treats NULLs as distinct inside UNIQUE
//! indexes and the uniqueness contract must live in the store itself.
//!
//! ## odds_opening
//! Insert-once first-observed snapshot per `(event_id, odd_id, line)`. Later
//! ingestion cycles for the same key are no-ops (`ON CONFLICT DO NOTHING`).
//!
//! ## wagers
//! - id: TEXT, created by the marketplace layer
//! - status: 'pending' -> 'won' | 'lost' | 'push'
//! - settlement writes are conditional on status = 'pending'
//!
//! ## strategy_links
//! Many-to-many join between strategies and wagers, unique per pair.
//!
//! ## strategy_rollups
//! Cached aggregate per strategy, fully derivable from the links join.

pub mod models;
pub mod odds_repository;
pub mod strategy_repository;
pub mod wager_repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Database connection pool
pub type DbPool = SqlitePool;

/// Database errors, classified so callers can branch on category instead of
/// sniffing message text.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    /// Unique-constraint conflict. Expected under the insert-once contract
    /// of the opening store and duplicate link creation; swallowed and
    /// counted there, never surfaced as a failure.
    #[error("Conflict on {context}")]
    Conflict { context: String },

    /// Check/not-null/foreign-key violation: a write the schema refused.
    /// Fatal to that row, logged with key context, never aborts a batch.
    #[error("Constraint violation on {context}: {message}")]
    Constraint { context: String, message: String },
}

impl DatabaseError {
    /// Classify an sqlx error using the driver's structured error kind.
    pub fn from_sqlx(err: sqlx::Error, context: &str) -> Self {
        use sqlx::error::ErrorKind;

        match &err {
            sqlx::Error::Database(db) => match db.kind() {
                ErrorKind::UniqueViolation => DatabaseError::Conflict {
                    context: context.to_string(),
                },
                ErrorKind::CheckViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::ForeignKeyViolation => DatabaseError::Constraint {
                    context: context.to_string(),
                    message: db.message().to_string(),
                },
                _ => DatabaseError::Query(format!("{}: {}", context, err)),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DatabaseError::Connection(format!("{}: {}", context, err))
            }
            _ => DatabaseError::Query(format!("{}: {}", context, err)),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Conflict { .. })
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, DatabaseError::Constraint { .. })
    }
}

/// Initialize the database connection pool
///
/// # Arguments
/// - `database_url`: Path to SQLite database file (e.g., "sqlite://data/linekeeper.db")
///
/// # Returns
/// Database connection pool ready for use
///
/// # Errors
/// Returns error if database connection fails or migrations fail
pub async fn init_database(database_url: &str) -> Result<DbPool, DatabaseError> {
    info!("Initializing database: {}", database_url);

    // Ensure data directory exists
    if let Some(db_path) = database_url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::Connection(format!("create data dir: {}", e)))?;
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| DatabaseError::Connection(format!("parse database url: {}", e)))?
        .create_if_missing(true)
        .log_statements(tracing::log::LevelFilter::Debug);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::Connection(format!("connect: {}", e)))?;

    run_migrations(&pool).await?;

    info!("✓ Database initialized successfully");

    Ok(pool)
}

/// In-memory database for tests. A single connection keeps every query on
/// the same in-memory instance.
pub async fn init_memory_database() -> Result<DbPool, DatabaseError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| DatabaseError::Connection(format!("parse database url: {}", e)))?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::Connection(format!("connect: {}", e)))?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run database migrations
async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");

    for (table, ddl) in [
        (
            "odds_current",
            r#"
            CREATE TABLE IF NOT EXISTS odds_current (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_id TEXT NOT NULL,
                odd_id TEXT NOT NULL,
                line TEXT NOT NULL DEFAULT '',
                market_name TEXT NOT NULL,
                bet_type_id TEXT,
                side_id TEXT,
                draftkings_price REAL,
                fanduel_price REAL,
                betmgm_price REAL,
                caesars_price REAL,
                classification TEXT NOT NULL,
                settled_score REAL,
                fetched_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                UNIQUE(event_id, odd_id, line)
            )
            "#,
        ),
        (
            "odds_opening",
            r#"
            CREATE TABLE IF NOT EXISTS odds_opening (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_id TEXT NOT NULL,
                odd_id TEXT NOT NULL,
                line TEXT NOT NULL DEFAULT '',
                market_name TEXT NOT NULL,
                bet_type_id TEXT,
                side_id TEXT,
                draftkings_price REAL,
                fanduel_price REAL,
                betmgm_price REAL,
                caesars_price REAL,
                classification TEXT NOT NULL,
                fetched_at DATETIME NOT NULL,
                UNIQUE(event_id, odd_id, line)
            )
            "#,
        ),
        (
            "wagers",
            r#"
            CREATE TABLE IF NOT EXISTS wagers (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                odd_id TEXT NOT NULL,
                line TEXT NOT NULL DEFAULT '',
                bet_type TEXT NOT NULL CHECK(bet_type IN ('moneyline', 'spread', 'total', 'prop')),
                side TEXT NOT NULL CHECK(side IN ('over', 'under', 'home', 'away')),
                stake REAL NOT NULL,
                price REAL NOT NULL,
                potential_payout REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK(status IN ('pending', 'won', 'lost', 'push')),
                settled_at DATETIME,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        ),
        (
            "strategy_links",
            r#"
            CREATE TABLE IF NOT EXISTS strategy_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                strategy_id TEXT NOT NULL,
                wager_id TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(strategy_id, wager_id)
            )
            "#,
        ),
        (
            "strategy_rollups",
            r#"
            CREATE TABLE IF NOT EXISTS strategy_rollups (
                strategy_id TEXT PRIMARY KEY,
                total_bets INTEGER NOT NULL,
                settled_bets INTEGER NOT NULL,
                pending_bets INTEGER NOT NULL,
                winning_bets INTEGER NOT NULL,
                losing_bets INTEGER NOT NULL,
                push_bets INTEGER NOT NULL,
                win_rate REAL NOT NULL,
                roi_percentage REAL NOT NULL,
                last_calculated_at DATETIME NOT NULL
            )
            "#,
        ),
    ] {
        sqlx::query(ddl).execute(pool).await.map_err(|e| {
            DatabaseError::Migration(format!("Failed to create {} table: {}", table, e))
        })?;
    }

    // Indexes for the hot query paths
    for ddl in [
        "CREATE INDEX IF NOT EXISTS idx_odds_current_event ON odds_current(event_id)",
        "CREATE INDEX IF NOT EXISTS idx_odds_opening_event ON odds_opening(event_id)",
        "CREATE INDEX IF NOT EXISTS idx_wagers_event_status ON wagers(event_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_strategy_links_wager ON strategy_links(wager_id)",
    ] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::Migration(format!("Failed to create index: {}", e)))?;
    }

    info!("✓ Migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_database_initializes() {
        let pool = init_memory_database().await.expect("init");
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
                .fetch_one(&pool)
                .await
                .expect("query");
        assert!(count.0 >= 5);
    }

    #[tokio::test]
    async fn test_unique_violation_classified_as_conflict() {
        let pool = init_memory_database().await.expect("init");
        let insert = "INSERT INTO strategy_links (strategy_id, wager_id) VALUES ('s1', 'w1')";
        sqlx::query(insert).execute(&pool).await.expect("first insert");
        let err = sqlx::query(insert)
            .execute(&pool)
            .await
            .expect_err("duplicate insert");
        let classified = DatabaseError::from_sqlx(err, "strategy_links(s1, w1)");
        assert!(classified.is_conflict());
    }

    #[tokio::test]
    async fn test_check_violation_classified_as_constraint() {
        let pool = init_memory_database().await.expect("init");
        let err = sqlx::query(
            "INSERT INTO wagers (id, user_id, event_id, odd_id, bet_type, side, stake, price, potential_payout, status)
             VALUES ('w1', 'u1', 'e1', 'o1', 'bad_type', 'over', 10.0, -110.0, 19.0, 'pending')",
        )
        .execute(&pool)
        .await
        .expect_err("check violation");
        let classified = DatabaseError::from_sqlx(err, "wagers(w1)");
        assert!(classified.is_constraint());
    }
}
