//! Outcome derivation.
//!
//! Once a wager is matched to a settled odds row, the outcome follows from
//! the row's settled score against the wager's line and side using the
//! standard sign conventions. A tie on a whole-number line with no
//! half-point is a push; everything else is binary win/lose.

use std::cmp::Ordering;

use crate::domain::entities::odds_row::OddsRow;
use crate::domain::entities::wager::{BetType, Wager, WagerSide, WagerStatus};

/// Derive the settlement outcome for a matched wager.
///
/// Returns `None` when the outcome cannot be derived: the row carries no
/// settled score, or a spread/total wager has no recoverable threshold. The
/// caller leaves such wagers pending rather than guessing.
pub fn derive_outcome(wager: &Wager, row: &OddsRow) -> Option<WagerStatus> {
    let score = row.settled_score?;

    match wager.bet_type {
        // Score is the side-relevant margin; positive means the taken side won.
        BetType::Moneyline => Some(from_signum(score)),
        // Score plus the handicap, same sign convention.
        BetType::Spread => {
            let line = wager_threshold(wager)?;
            Some(from_signum(score + line))
        }
        BetType::Total => over_under(wager, score),
        BetType::Prop => match wager.side {
            WagerSide::Over | WagerSide::Under => over_under(wager, score),
            WagerSide::Home | WagerSide::Away => Some(from_signum(score)),
        },
    }
}

fn over_under(wager: &Wager, score: f64) -> Option<WagerStatus> {
    let line = wager_threshold(wager)?;
    let ordering = score.partial_cmp(&line)?;
    Some(match (wager.side, ordering) {
        // an over/under outcome needs an over/under side
        (WagerSide::Home | WagerSide::Away, _) => return None,
        (_, Ordering::Equal) => WagerStatus::Push,
        (WagerSide::Over, Ordering::Greater) => WagerStatus::Won,
        (WagerSide::Over, Ordering::Less) => WagerStatus::Lost,
        (WagerSide::Under, Ordering::Less) => WagerStatus::Won,
        (WagerSide::Under, Ordering::Greater) => WagerStatus::Lost,
    })
}

fn from_signum(value: f64) -> WagerStatus {
    if value > 0.0 {
        WagerStatus::Won
    } else if value < 0.0 {
        WagerStatus::Lost
    } else {
        WagerStatus::Push
    }
}

/// Threshold for a spread/total wager: the wager's own line when present,
/// otherwise the trailing numeric token of the proposition key (the feed
/// embeds main-line thresholds there, e.g. `total-home-runs-over-8.5`).
pub fn wager_threshold(wager: &Wager) -> Option<f64> {
    wager
        .line
        .threshold()
        .or_else(|| trailing_number(&wager.odd_id))
}

fn trailing_number(odd_id: &str) -> Option<f64> {
    odd_id
        .rsplit('-')
        .find_map(|segment| segment.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
