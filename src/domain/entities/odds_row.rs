use chrono::{DateTime, Utc};

use crate::domain::value_objects::line::Line;

/// Per-sportsbook quoted prices for one row. Each column is independently
/// nullable; a book simply not quoting a line leaves its slot empty.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BookPrices {
    pub draftkings: Option<f64>,
    pub fanduel: Option<f64>,
    pub betmgm: Option<f64>,
    pub caesars: Option<f64>,
}

impl BookPrices {
    pub fn set(&mut self, book: &str, price: f64) -> bool {
        match book {
            "draftkings" => self.draftkings = Some(price),
            "fanduel" => self.fanduel = Some(price),
            "betmgm" => self.betmgm = Some(price),
            "caesars" => self.caesars = Some(price),
            _ => return false,
        }
        true
    }

    /// Fill empty slots from another quote set; existing prices win.
    pub fn merge(&mut self, other: &BookPrices) {
        self.draftkings = self.draftkings.or(other.draftkings);
        self.fanduel = self.fanduel.or(other.fanduel);
        self.betmgm = self.betmgm.or(other.betmgm);
        self.caesars = self.caesars.or(other.caesars);
    }

    pub fn is_empty(&self) -> bool {
        self.draftkings.is_none()
            && self.fanduel.is_none()
            && self.betmgm.is_none()
            && self.caesars.is_none()
    }
}

/// Best-effort proposition classification. Metadata for reporting only; it
/// never participates in the uniqueness key or in settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketClass {
    MainMarket,
    PlayerProp,
    TeamProp,
    GameProp,
}

impl MarketClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketClass::MainMarket => "main_market",
            MarketClass::PlayerProp => "player_prop",
            MarketClass::TeamProp => "team_prop",
            MarketClass::GameProp => "game_prop",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "main_market" => Ok(MarketClass::MainMarket),
            "player_prop" => Ok(MarketClass::PlayerProp),
            "team_prop" => Ok(MarketClass::TeamProp),
            "game_prop" => Ok(MarketClass::GameProp),
            other => Err(format!("Unknown market class: {}", other)),
        }
    }
}

impl std::fmt::Display for MarketClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical odds row, the unit written by ingestion.
///
/// Uniqueness key within each store: `(event_id, odd_id, line)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OddsRow {
    pub event_id: String,
    pub odd_id: String,
    pub line: Line,
    pub market_name: String,
    pub bet_type_id: Option<String>,
    pub side_id: Option<String>,
    pub prices: BookPrices,
    pub classification: MarketClass,
    pub settled_score: Option<f64>,
    pub fetched_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_known_and_unknown_book() {
        let mut prices = BookPrices::default();
        assert!(prices.set("fanduel", -110.0));
        assert!(!prices.set("bovada", 100.0));
        assert_eq!(prices.fanduel, Some(-110.0));
    }

    #[test]
    fn test_merge_keeps_existing_prices() {
        let mut a = BookPrices {
            draftkings: Some(-115.0),
            ..Default::default()
        };
        let b = BookPrices {
            draftkings: Some(-120.0),
            fanduel: Some(105.0),
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.draftkings, Some(-115.0));
        assert_eq!(a.fanduel, Some(105.0));
    }

    #[test]
    fn test_is_empty() {
        assert!(BookPrices::default().is_empty());
        let mut p = BookPrices::default();
        p.set("betmgm", 120.0);
        assert!(!p.is_empty());
    }

    #[test]
    fn test_market_class_round_trip() {
        for class in [
            MarketClass::MainMarket,
            MarketClass::PlayerProp,
            MarketClass::TeamProp,
            MarketClass::GameProp,
        ] {
            assert_eq!(MarketClass::parse(class.as_str()).unwrap(), class);
        }
    }
}
