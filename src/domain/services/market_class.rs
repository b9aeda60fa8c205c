//! Market classification heuristics.
//!
//! Best-effort labeling of a proposition as a main market, player prop, team
//! prop or game prop, derived from the shape of the proposition key and
//! keywords in the market name. Misclassification is metadata noise only;
//! nothing here feeds the uniqueness key or settlement.

use once_cell::sync::Lazy;

use crate::domain::entities::odds_row::MarketClass;

/// Keyword families naming the core markets every book carries.
static CORE_MARKET_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "moneyline",
        "money line",
        "spread",
        "point spread",
        "run line",
        "puck line",
        "total",
    ]
});

/// Classify a proposition from its key and market name.
///
/// Proposition keys are dash-joined segments in the form
/// `statID-entityID-periodID-betTypeID-sideID`. The entity segment carries
/// the scope: `home`/`away` for a team, `all` for the whole game, and an
/// underscore-joined player identifier (e.g. `JOSH_ALLEN_1_NFL`) for player
/// props.
pub fn classify(odd_id: &str, market_name: &str) -> MarketClass {
    let segments: Vec<&str> = odd_id.split('-').collect();

    if segments.iter().any(|s| is_player_entity(s)) {
        return MarketClass::PlayerProp;
    }

    let name_lower = market_name.to_lowercase();
    let core = CORE_MARKET_KEYWORDS.iter().any(|kw| name_lower.contains(kw));

    if segments.iter().any(|s| *s == "home" || *s == "away") {
        if core {
            MarketClass::MainMarket
        } else {
            MarketClass::TeamProp
        }
    } else if segments.iter().any(|s| *s == "all") {
        if core {
            MarketClass::MainMarket
        } else {
            MarketClass::GameProp
        }
    } else {
        MarketClass::MainMarket
    }
}

/// Player identifier segments are underscore-joined uppercase tokens.
fn is_player_entity(segment: &str) -> bool {
    segment.contains('_')
        && segment
            .chars()
            .any(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
