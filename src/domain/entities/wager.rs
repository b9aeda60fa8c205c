use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::line::Line;

/// Wager lifecycle: `Pending` until the settlement matcher resolves it, then
/// exactly one of the settled states. Settled wagers are immutable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerStatus {
    Pending,
    Won,
    Lost,
    Push,
}

impl WagerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WagerStatus::Pending => "pending",
            WagerStatus::Won => "won",
            WagerStatus::Lost => "lost",
            WagerStatus::Push => "push",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(WagerStatus::Pending),
            "won" => Ok(WagerStatus::Won),
            "lost" => Ok(WagerStatus::Lost),
            "push" => Ok(WagerStatus::Push),
            other => Err(format!("Unknown wager status: {}", other)),
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, WagerStatus::Pending)
    }
}

impl std::fmt::Display for WagerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared market classification on the wager itself, used by the tier-3
/// settlement fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    Moneyline,
    Spread,
    Total,
    Prop,
}

impl BetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Moneyline => "moneyline",
            BetType::Spread => "spread",
            BetType::Total => "total",
            BetType::Prop => "prop",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "moneyline" => Ok(BetType::Moneyline),
            "spread" => Ok(BetType::Spread),
            "total" => Ok(BetType::Total),
            "prop" => Ok(BetType::Prop),
            other => Err(format!("Unknown bet type: {}", other)),
        }
    }
}

/// Which side of the proposition the wager took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerSide {
    Over,
    Under,
    Home,
    Away,
}

impl WagerSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            WagerSide::Over => "over",
            WagerSide::Under => "under",
            WagerSide::Home => "home",
            WagerSide::Away => "away",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "over" => Ok(WagerSide::Over),
            "under" => Ok(WagerSide::Under),
            "home" => Ok(WagerSide::Home),
            "away" => Ok(WagerSide::Away),
            other => Err(format!("Unknown wager side: {}", other)),
        }
    }
}

/// A recorded bet referencing an event proposition.
#[derive(Debug, Clone)]
pub struct Wager {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub odd_id: String,
    pub line: Line,
    pub bet_type: BetType,
    pub side: WagerSide,
    pub stake: f64,
    pub price: f64,
    pub potential_payout: f64,
    pub status: WagerStatus,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Wager {
    /// Profit contributed to ROI once settled: stake-relative, zero for push.
    pub fn settled_profit(&self) -> Option<f64> {
        match self.status {
            WagerStatus::Won => Some(self.potential_payout - self.stake),
            WagerStatus::Lost => Some(-self.stake),
            WagerStatus::Push => Some(0.0),
            WagerStatus::Pending => None,
        }
    }
}
