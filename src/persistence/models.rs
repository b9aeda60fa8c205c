//! Database Models
//!
//! Persistent data structures for the odds stores, wagers, strategy links
//! and rollups, plus conversions to the domain entities the services work
//! with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::entities::odds_row::{BookPrices, MarketClass, OddsRow};
use crate::domain::entities::strategy::StrategyRollup;
use crate::domain::entities::wager::{BetType, Wager, WagerSide, WagerStatus};
use crate::domain::value_objects::line::Line;
use crate::domain::value_objects::odds_price::AmericanOdds;
use crate::domain::value_objects::stake::Stake;

/// Odds row as stored in either odds table. `line` holds the storage form
/// (empty string = main line).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OddsRowRecord {
    pub id: i64,
    pub event_id: String,
    pub odd_id: String,
    pub line: String,
    pub market_name: String,
    pub bet_type_id: Option<String>,
    pub side_id: Option<String>,
    pub draftkings_price: Option<f64>,
    pub fanduel_price: Option<f64>,
    pub betmgm_price: Option<f64>,
    pub caesars_price: Option<f64>,
    pub classification: String,
    pub settled_score: Option<f64>,
    pub fetched_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OddsRowRecord {
    pub fn into_domain(self) -> OddsRow {
        OddsRow {
            line: Line::from_storage(&self.line),
            classification: MarketClass::parse(&self.classification)
                .unwrap_or(MarketClass::MainMarket),
            event_id: self.event_id,
            odd_id: self.odd_id,
            market_name: self.market_name,
            bet_type_id: self.bet_type_id,
            side_id: self.side_id,
            prices: BookPrices {
                draftkings: self.draftkings_price,
                fanduel: self.fanduel_price,
                betmgm: self.betmgm_price,
                caesars: self.caesars_price,
            },
            settled_score: self.settled_score,
            fetched_at: self.fetched_at,
            updated_at: self.updated_at,
        }
    }
}

/// Wager record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WagerRecord {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub odd_id: String,
    pub line: String,
    pub bet_type: String,
    pub side: String,
    pub stake: f64,
    pub price: f64,
    pub potential_payout: f64,
    pub status: String,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WagerRecord {
    /// Parse the stored enums; the CHECK constraints keep these valid, so a
    /// failure here means the record predates the schema.
    pub fn into_domain(self) -> Result<Wager, String> {
        Ok(Wager {
            line: Line::from_storage(&self.line),
            bet_type: BetType::parse(&self.bet_type)?,
            side: WagerSide::parse(&self.side)?,
            status: WagerStatus::parse(&self.status)?,
            id: self.id,
            user_id: self.user_id,
            event_id: self.event_id,
            odd_id: self.odd_id,
            stake: self.stake,
            price: self.price,
            potential_payout: self.potential_payout,
            settled_at: self.settled_at,
        })
    }
}

/// Create wager input (the marketplace layer owns wager creation; this
/// input exists for the write path and for tests).
#[derive(Debug, Clone)]
pub struct CreateWager {
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
}

impl CreateWager {
    /// Validated construction: checks stake and price and derives the
    /// potential payout at the quoted odds.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        user_id: String,
        event_id: String,
        odd_id: String,
        line: Line,
        bet_type: BetType,
        side: WagerSide,
        stake: f64,
        price: f64,
    ) -> Result<Self, String> {
        let stake = Stake::new(stake)?;
        let price = AmericanOdds::new(price)?;
        Ok(CreateWager {
            id,
            user_id,
            event_id,
            odd_id,
            line,
            bet_type,
            side,
            stake: stake.value(),
            price: price.value(),
            potential_payout: price.potential_payout(stake.value()),
        })
    }
}

/// Strategy rollup record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StrategyRollupRecord {
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

impl StrategyRollupRecord {
    pub fn into_domain(self) -> StrategyRollup {
        StrategyRollup {
            strategy_id: self.strategy_id,
            total_bets: self.total_bets,
            settled_bets: self.settled_bets,
            pending_bets: self.pending_bets,
            winning_bets: self.winning_bets,
            losing_bets: self.losing_bets,
            push_bets: self.push_bets,
            win_rate: self.win_rate,
            roi_percentage: self.roi_percentage,
            last_calculated_at: self.last_calculated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_wager_derives_payout() {
        let input = CreateWager::new(
            "w1".to_string(),
            "u1".to_string(),
            "evt-1".to_string(),
            "points-home-game-ml-home".to_string(),
            Line::Main,
            BetType::Moneyline,
            WagerSide::Home,
            100.0,
            150.0,
        )
        .expect("valid wager");
        assert_eq!(input.potential_payout, 250.0);
    }

    #[test]
    fn test_create_wager_rejects_bad_inputs() {
        let bad_stake = CreateWager::new(
            "w1".to_string(),
            "u1".to_string(),
            "evt-1".to_string(),
            "o1".to_string(),
            Line::Main,
            BetType::Moneyline,
            WagerSide::Home,
            0.0,
            150.0,
        );
        assert!(bad_stake.is_err());

        let bad_price = CreateWager::new(
            "w1".to_string(),
            "u1".to_string(),
            "evt-1".to_string(),
            "o1".to_string(),
            Line::Main,
            BetType::Moneyline,
            WagerSide::Home,
            100.0,
            50.0,
        );
        assert!(bad_price.is_err());
    }
}
