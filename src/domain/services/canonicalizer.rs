//! Canonicalizer
//!
//! Pure transformation from one event's raw market payload into the ordered
//! canonical row set ingestion writes. No I/O: the same payload always
//! produces the same rows, which is what makes re-ingestion idempotent
//! downstream.
//!
//! Shape rules:
//! - every proposition emits one main-line row keyed `(odd_id, Main)`,
//!   merging all bookmakers' quoted prices;
//! - each distinct normalized alternate line emits one additional row; two
//!   books quoting the same line value land in the same row, deduplicated by
//!   an application-level map keyed `(odd_id, Line)` built in this single
//!   pass;
//! - markets missing a usable name are dropped with a reason and the rest of
//!   the payload continues.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::entities::odds_row::{BookPrices, OddsRow};
use crate::domain::repositories::odds_feed::RawEventOdds;
use crate::domain::services::market_class::classify;
use crate::domain::value_objects::line::Line;

/// A proposition dropped during canonicalization for a data-shape reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedMarket {
    pub odd_id: String,
    pub reason: String,
}

/// Output of one canonicalization pass.
#[derive(Debug, Clone)]
pub struct CanonicalBatch {
    /// Rows sorted by `(odd_id, line)`, main line first within a proposition.
    pub rows: Vec<OddsRow>,
    pub dropped: Vec<DroppedMarket>,
}

/// Canonicalize one event's raw payload.
pub fn canonicalize(raw: &RawEventOdds, fetched_at: DateTime<Utc>) -> CanonicalBatch {
    let mut keyed: BTreeMap<(String, Line), OddsRow> = BTreeMap::new();
    let mut dropped = Vec::new();

    for (odd_id, market) in &raw.odds {
        if odd_id.trim().is_empty() {
            dropped.push(DroppedMarket {
                odd_id: odd_id.clone(),
                reason: "empty proposition key".to_string(),
            });
            continue;
        }
        let market_name = match market.market_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                dropped.push(DroppedMarket {
                    odd_id: odd_id.clone(),
                    reason: "missing market_name".to_string(),
                });
                continue;
            }
        };

        let classification = classify(odd_id, &market_name);
        let template = OddsRow {
            event_id: raw.event_id.clone(),
            odd_id: odd_id.clone(),
            line: Line::Main,
            market_name,
            bet_type_id: market.bet_type_id.clone(),
            side_id: market.side_id.clone(),
            prices: BookPrices::default(),
            classification,
            settled_score: None,
            fetched_at,
            updated_at: fetched_at,
        };

        // The main row exists even when no book quotes it right now, so the
        // opening store captures the proposition the first time it is seen.
        keyed
            .entry((odd_id.clone(), Line::Main))
            .or_insert_with(|| template.clone());

        for (book, quote) in market.books() {
            let Some(quote) = quote else { continue };

            if let Some(price) = quote.price {
                if let Some(row) = keyed.get_mut(&(odd_id.clone(), Line::Main)) {
                    row.prices.set(book, price);
                }
            }

            for alt in &quote.alternates {
                let Some(price) = alt.price else { continue };
                let line = Line::normalize(alt.line.as_ref());
                let row = keyed.entry((odd_id.clone(), line.clone())).or_insert_with(|| {
                    let mut r = template.clone();
                    r.line = line.clone();
                    r
                });
                row.prices.set(book, price);
            }
        }
    }

    dropped.sort_by(|a, b| a.odd_id.cmp(&b.odd_id));
    CanonicalBatch {
        rows: keyed.into_values().collect(),
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::odds_row::MarketClass;
    use crate::domain::repositories::odds_feed::{RawAlternate, RawBookQuote, RawMarket};
    use serde_json::json;
    use std::collections::HashMap;

    fn quote(price: f64) -> RawBookQuote {
        RawBookQuote {
            price: Some(price),
            alternates: vec![],
        }
    }

    fn alt(line: serde_json::Value, price: f64) -> RawAlternate {
        RawAlternate {
            line: Some(line),
            price: Some(price),
        }
    }

    fn payload(odds: Vec<(&str, RawMarket)>) -> RawEventOdds {
        RawEventOdds {
            event_id: "evt-1".to_string(),
            odds: odds
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_main_line_row_merges_all_books() {
        let raw = payload(vec![(
            "points-home-game-ml-home",
            RawMarket {
                market_name: Some("Moneyline".to_string()),
                bet_type_id: Some("ml".to_string()),
                side_id: Some("home".to_string()),
                draftkings: Some(quote(-115.0)),
                fanduel: Some(quote(-112.0)),
                ..Default::default()
            },
        )]);
        let batch = canonicalize(&raw, Utc::now());
        assert_eq!(batch.rows.len(), 1);
        let row = &batch.rows[0];
        assert_eq!(row.line, Line::Main);
        assert_eq!(row.prices.draftkings, Some(-115.0));
        assert_eq!(row.prices.fanduel, Some(-112.0));
        assert_eq!(row.classification, MarketClass::MainMarket);
    }

    #[test]
    fn test_same_alternate_line_from_two_books_merges_into_one_row() {
        let raw = payload(vec![(
            "points-home-game-sp-home",
            RawMarket {
                market_name: Some("Point Spread".to_string()),
                draftkings: Some(RawBookQuote {
                    price: Some(-110.0),
                    alternates: vec![alt(json!(3.5), 120.0)],
                }),
                fanduel: Some(RawBookQuote {
                    price: Some(-108.0),
                    alternates: vec![alt(json!("3.5"), 118.0)],
                }),
                ..Default::default()
            },
        )]);
        let batch = canonicalize(&raw, Utc::now());
        assert_eq!(batch.rows.len(), 2);
        let alt_row = batch
            .rows
            .iter()
            .find(|r| r.line == Line::At("3.5".to_string()))
            .expect("alternate row");
        assert_eq!(alt_row.prices.draftkings, Some(120.0));
        assert_eq!(alt_row.prices.fanduel, Some(118.0));
    }

    #[test]
    fn test_null_string_alternate_merges_into_main_row() {
        let raw = payload(vec![(
            "points-all-game-ou-over",
            RawMarket {
                market_name: Some("Total Points".to_string()),
                betmgm: Some(RawBookQuote {
                    price: None,
                    alternates: vec![alt(json!("null"), -105.0)],
                }),
                ..Default::default()
            },
        )]);
        let batch = canonicalize(&raw, Utc::now());
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].line, Line::Main);
        assert_eq!(batch.rows[0].prices.betmgm, Some(-105.0));
    }

    #[test]
    fn test_missing_market_name_drops_proposition_only() {
        let raw = payload(vec![
            (
                "points-home-game-ml-home",
                RawMarket {
                    market_name: Some("Moneyline".to_string()),
                    caesars: Some(quote(100.0)),
                    ..Default::default()
                },
            ),
            ("broken-key", RawMarket::default()),
        ]);
        let batch = canonicalize(&raw, Utc::now());
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.dropped.len(), 1);
        assert_eq!(batch.dropped[0].odd_id, "broken-key");
        assert_eq!(batch.dropped[0].reason, "missing market_name");
    }

    #[test]
    fn test_canonicalization_is_deterministic() {
        let raw = payload(vec![
            (
                "points-home-game-sp-home",
                RawMarket {
                    market_name: Some("Point Spread".to_string()),
                    draftkings: Some(RawBookQuote {
                        price: Some(-110.0),
                        alternates: vec![alt(json!(2.5), 130.0), alt(json!(-2.5), -140.0)],
                    }),
                    ..Default::default()
                },
            ),
            (
                "points-all-game-ou-over",
                RawMarket {
                    market_name: Some("Total Points".to_string()),
                    fanduel: Some(quote(-105.0)),
                    ..Default::default()
                },
            ),
        ]);
        let now = Utc::now();
        let a = canonicalize(&raw, now);
        let b = canonicalize(&raw, now);
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.dropped, b.dropped);
        // sorted by (odd_id, line), main line first inside a proposition
        let keys: Vec<_> = a
            .rows
            .iter()
            .map(|r| (r.odd_id.clone(), r.line.clone()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_main_row_emitted_without_any_prices() {
        let raw = payload(vec![(
            "home_runs-home-game-ou-over",
            RawMarket {
                market_name: Some("Home Runs".to_string()),
                ..Default::default()
            },
        )]);
        let batch = canonicalize(&raw, Utc::now());
        assert_eq!(batch.rows.len(), 1);
        assert!(batch.rows[0].prices.is_empty());
    }
}
