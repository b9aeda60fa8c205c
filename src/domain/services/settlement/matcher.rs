//! Tiered settlement matching.
//!
//! Resolves a pending wager to the single odds row that determines its
//! outcome. Three tiers, first success wins:
//!
//! 1. exact `(odd_id, line)` key match;
//! 2. case-folded substring match on the proposition key in either
//!   direction, which absorbs identifier drift between the price feed and
//!   the settlement feed;
//! 3. market-type keyword heuristic against the row's market name.
//!
//! Any ambiguity leaves the wager unresolved. An unresolved wager is not an
//! error; it stays pending and is retried on a later run.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;

use crate::domain::entities::odds_row::OddsRow;
use crate::domain::entities::wager::{BetType, Wager};
use crate::domain::value_objects::line::Line;

/// Keyword families for the tier-3 market-type heuristic.
static MARKET_TYPE_KEYWORDS: Lazy<Vec<(BetType, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        (BetType::Moneyline, vec!["moneyline", "money line"]),
        (
            BetType::Spread,
            vec!["spread", "handicap", "run line", "puck line"],
        ),
        (BetType::Total, vec!["total", "over", "under"]),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Pattern,
    MarketType,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchTier::Exact => write!(f, "exact"),
            MatchTier::Pattern => write!(f, "pattern"),
            MatchTier::MarketType => write!(f, "market_type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No tier produced a candidate row.
    NoCandidate,
    /// More than one row qualified and none could be preferred safely.
    AmbiguousCandidates(usize),
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedReason::NoCandidate => write!(f, "no candidate row"),
            UnresolvedReason::AmbiguousCandidates(n) => {
                write!(f, "{} candidate rows, refusing to pick one", n)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult<'a> {
    Matched { row: &'a OddsRow, tier: MatchTier },
    Unresolved(UnresolvedReason),
}

/// Resolve a wager against the settled rows of its event.
pub fn match_wager<'a>(wager: &Wager, rows: &'a [OddsRow]) -> MatchResult<'a> {
    if let Some(row) = exact_match(wager, rows) {
        return MatchResult::Matched {
            row,
            tier: MatchTier::Exact,
        };
    }
    match pattern_match(wager, rows) {
        PatternOutcome::Found(row) => {
            return MatchResult::Matched {
                row,
                tier: MatchTier::Pattern,
            }
        }
        PatternOutcome::Ambiguous(n) => {
            return MatchResult::Unresolved(UnresolvedReason::AmbiguousCandidates(n))
        }
        PatternOutcome::None => {}
    }
    market_type_match(wager, rows)
}

fn exact_match<'a>(wager: &Wager, rows: &'a [OddsRow]) -> Option<&'a OddsRow> {
    rows.iter()
        .find(|r| r.odd_id == wager.odd_id && r.line == wager.line)
}

enum PatternOutcome<'a> {
    Found(&'a OddsRow),
    Ambiguous(usize),
    None,
}

/// Tier 2: case-folded substring in either direction. Candidates spanning
/// more than one distinct proposition key are ambiguous; within a single
/// key, a row with the wager's exact line is preferred, and a lone row is
/// accepted as-is.
fn pattern_match<'a>(wager: &Wager, rows: &'a [OddsRow]) -> PatternOutcome<'a> {
    let needle = wager.odd_id.to_lowercase();
    if needle.is_empty() {
        return PatternOutcome::None;
    }

    let candidates: Vec<&OddsRow> = rows
        .iter()
        .filter(|r| {
            let hay = r.odd_id.to_lowercase();
            hay.contains(&needle) || needle.contains(&hay)
        })
        .collect();
    if candidates.is_empty() {
        return PatternOutcome::None;
    }

    let distinct_ids: BTreeSet<&str> =
        candidates.iter().map(|r| r.odd_id.as_str()).collect();
    if distinct_ids.len() > 1 {
        return PatternOutcome::Ambiguous(candidates.len());
    }

    if let Some(row) = candidates.iter().find(|r| r.line == wager.line).copied() {
        return PatternOutcome::Found(row);
    }
    if candidates.len() == 1 {
        return PatternOutcome::Found(candidates[0]);
    }
    PatternOutcome::Ambiguous(candidates.len())
}

/// Tier 3: the wager's declared bet type against market-name keywords, with
/// line equality. Fires only when tiers 1-2 produced nothing, and must
/// select exactly one row.
fn market_type_match<'a>(wager: &Wager, rows: &'a [OddsRow]) -> MatchResult<'a> {
    let Some(keywords) = MARKET_TYPE_KEYWORDS
        .iter()
        .find(|(bet_type, _)| *bet_type == wager.bet_type)
        .map(|(_, kws)| kws)
    else {
        return MatchResult::Unresolved(UnresolvedReason::NoCandidate);
    };

    let candidates: Vec<&OddsRow> = rows
        .iter()
        .filter(|r| {
            let name = r.market_name.to_lowercase();
            r.line == wager.line && keywords.iter().any(|kw| name.contains(kw))
        })
        .collect();

    match candidates.as_slice() {
        [] => MatchResult::Unresolved(UnresolvedReason::NoCandidate),
        [row] => MatchResult::Matched {
            row: *row,
            tier: MatchTier::MarketType,
        },
        many => MatchResult::Unresolved(UnresolvedReason::AmbiguousCandidates(many.len())),
    }
}
