//! Rollup arithmetic.
//!
//! Pure computation of a strategy's aggregate from its linked wagers. The
//! rollup is a cache: it must always be recomputable from scratch to the
//! same value, so everything here derives from the wager tuples alone.

use chrono::{DateTime, Utc};

use crate::domain::entities::strategy::StrategyRollup;
use crate::domain::entities::wager::WagerStatus;

/// The slice of a wager the rollup needs.
#[derive(Debug, Clone, Copy)]
pub struct RollupInput {
    pub status: WagerStatus,
    pub stake: f64,
    pub potential_payout: f64,
}

/// Compute the full rollup for a strategy.
///
/// `total_bets` counts every linked wager, pending included. Win rate and
/// ROI use settled wagers only; pushed wagers count toward the settled
/// partition but contribute zero to both ROI sums.
pub fn compute_rollup(
    strategy_id: &str,
    wagers: &[RollupInput],
    now: DateTime<Utc>,
) -> StrategyRollup {
    let mut winning = 0i64;
    let mut losing = 0i64;
    let mut push = 0i64;
    let mut pending = 0i64;
    let mut profit_sum = 0.0;
    let mut stake_sum = 0.0;

    for wager in wagers {
        match wager.status {
            WagerStatus::Won => {
                winning += 1;
                profit_sum += wager.potential_payout - wager.stake;
                stake_sum += wager.stake;
            }
            WagerStatus::Lost => {
                losing += 1;
                profit_sum -= wager.stake;
                stake_sum += wager.stake;
            }
            WagerStatus::Push => {
                push += 1;
            }
            WagerStatus::Pending => {
                pending += 1;
            }
        }
    }

    let settled = winning + losing + push;
    let win_rate = if settled > 0 {
        winning as f64 / settled as f64
    } else {
        0.0
    };
    let roi_percentage = if stake_sum > 0.0 {
        profit_sum / stake_sum * 100.0
    } else {
        0.0
    };

    StrategyRollup {
        strategy_id: strategy_id.to_string(),
        total_bets: wagers.len() as i64,
        settled_bets: settled,
        pending_bets: pending,
        winning_bets: winning,
        losing_bets: losing,
        push_bets: push,
        win_rate,
        roi_percentage,
        last_calculated_at: now,
    }
}
