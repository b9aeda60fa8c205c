use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached aggregate performance for a strategy.
///
/// Derived entirely from the strategy's linked wagers; recomputation from
/// scratch must always reproduce it. `total_bets` counts every linked wager
/// including pending ones; `win_rate` and `roi_percentage` are computed over
/// the settled subset only, so `winning + losing + push == settled_bets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRollup {
    pub strategy_id: String,
    pub total_bets: i64,
    pub settled_bets: i64,
    pub pending_bets: i64,
    pub winning_bets: i64,
    pub losing_bets: i64,
    pub push_bets: i64,
    pub win_rate: f64,
    pub roi_percentage: f64,
    pub last_calculated_at: DateTime<Utc>,
}

impl StrategyRollup {
    /// Zeroed rollup for a strategy with no linked wagers.
    pub fn empty(strategy_id: &str, now: DateTime<Utc>) -> Self {
        StrategyRollup {
            strategy_id: strategy_id.to_string(),
            total_bets: 0,
            settled_bets: 0,
            pending_bets: 0,
            winning_bets: 0,
            losing_bets: 0,
            push_bets: 0,
            win_rate: 0.0,
            roi_percentage: 0.0,
            last_calculated_at: now,
        }
    }
}
