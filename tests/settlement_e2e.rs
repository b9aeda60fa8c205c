use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;

use linekeeper::application::services::ingestion_service::IngestionService;
use linekeeper::application::services::odds_writer::OddsWriter;
use linekeeper::application::services::rollup_service::RollupService;
use linekeeper::application::services::settlement_service::SettlementService;
use linekeeper::domain::entities::event::{Event, EventStatus};
use linekeeper::domain::entities::wager::{BetType, WagerSide};
use linekeeper::domain::repositories::game_catalog::{
    CatalogError, CatalogResult, GameCatalogClient,
};
use linekeeper::domain::repositories::odds_feed::{
    FeedError, FeedResult, OddsFeedClient, RawAlternate, RawBookQuote, RawEventOdds,
    RawEventResults, RawMarket,
};
use linekeeper::domain::value_objects::line::Line;
use linekeeper::persistence::models::CreateWager;
use linekeeper::persistence::odds_repository::OddsRepository;
use linekeeper::persistence::strategy_repository::StrategyRepository;
use linekeeper::persistence::wager_repository::WagerRepository;
use linekeeper::persistence::{init_memory_database, DbPool};

struct MockCatalog {
    events: Mutex<HashMap<String, Event>>,
}

impl MockCatalog {
    fn new() -> Self {
        MockCatalog {
            events: Mutex::new(HashMap::new()),
        }
    }

    fn put(&self, event: Event) {
        self.events.lock().unwrap().insert(event.id.clone(), event);
    }

    fn finalize(&self, event_id: &str, home_score: i64, away_score: i64) {
        if let Some(event) = self.events.lock().unwrap().get_mut(event_id) {
            event.status = EventStatus::Final;
            event.home_score = Some(home_score);
            event.away_score = Some(away_score);
        }
    }
}

#[async_trait]
impl GameCatalogClient for MockCatalog {
    async fn fetch_event(&self, event_id: &str) -> CatalogResult<Event> {
        self.events
            .lock()
            .unwrap()
            .get(event_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(event_id.to_string()))
    }
}

struct MockFeed {
    payloads: Mutex<HashMap<String, RawEventOdds>>,
    results: Mutex<HashMap<String, RawEventResults>>,
}

impl MockFeed {
    fn new() -> Self {
        MockFeed {
            payloads: Mutex::new(HashMap::new()),
            results: Mutex::new(HashMap::new()),
        }
    }

    fn put_odds(&self, payload: RawEventOdds) {
        self.payloads
            .lock()
            .unwrap()
            .insert(payload.event_id.clone(), payload);
    }

    fn put_results(&self, event_id: &str, scores: Vec<(&str, f64)>) {
        self.results.lock().unwrap().insert(
            event_id.to_string(),
            RawEventResults {
                event_id: event_id.to_string(),
                scores: scores
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            },
        );
    }
}

#[async_trait]
impl OddsFeedClient for MockFeed {
    async fn fetch_event_odds(&self, event_id: &str) -> FeedResult<RawEventOdds> {
        self.payloads
            .lock()
            .unwrap()
            .get(event_id)
            .cloned()
            .ok_or_else(|| FeedError::Status(404, format!("no odds for {}", event_id)))
    }

    async fn fetch_upcoming(
        &self,
        _league: &str,
        _lookahead_hours: i64,
        _include_alternates: bool,
    ) -> FeedResult<Vec<RawEventOdds>> {
        Ok(self.payloads.lock().unwrap().values().cloned().collect())
    }

    async fn fetch_event_results(&self, event_id: &str) -> FeedResult<RawEventResults> {
        self.results
            .lock()
            .unwrap()
            .get(event_id)
            .cloned()
            .ok_or_else(|| FeedError::Status(404, format!("no results for {}", event_id)))
    }
}

struct Harness {
    ingestion: IngestionService,
    settlement: SettlementService,
    rollups: Arc<RollupService>,
    wagers: Arc<WagerRepository>,
    strategies: Arc<StrategyRepository>,
    catalog: Arc<MockCatalog>,
    feed: Arc<MockFeed>,
    _pool: DbPool,
}

async fn harness() -> Harness {
    let pool = init_memory_database().await.expect("init db");
    let odds_repo = Arc::new(OddsRepository::new(pool.clone()));
    let wagers = Arc::new(WagerRepository::new(pool.clone()));
    let strategies = Arc::new(StrategyRepository::new(pool.clone()));
    let writer = Arc::new(OddsWriter::new(odds_repo.clone()));
    let rollups = Arc::new(RollupService::new(strategies.clone()));
    let catalog = Arc::new(MockCatalog::new());
    let feed = Arc::new(MockFeed::new());

    let ingestion = IngestionService::new(
        feed.clone(),
        catalog.clone(),
        writer,
        "MLB".to_string(),
        48,
        true,
        4,
    );
    let settlement = SettlementService::new(
        feed.clone(),
        catalog.clone(),
        odds_repo,
        wagers.clone(),
        rollups.clone(),
    );

    Harness {
        ingestion,
        settlement,
        rollups,
        wagers,
        strategies,
        catalog,
        feed,
        _pool: pool,
    }
}

fn scheduled_event(id: &str) -> Event {
    Event {
        id: id.to_string(),
        home_team: "Yankees".to_string(),
        away_team: "Red Sox".to_string(),
        starts_at: Utc::now() + Duration::hours(6),
        status: EventStatus::Scheduled,
        home_score: None,
        away_score: None,
    }
}

fn event_payload(event_id: &str) -> RawEventOdds {
    let mut odds = HashMap::new();
    odds.insert(
        "points-home-game-ml-home".to_string(),
        RawMarket {
            market_name: Some("Moneyline".to_string()),
            bet_type_id: Some("ml".to_string()),
            side_id: Some("home".to_string()),
            draftkings: Some(RawBookQuote {
                price: Some(-120.0),
                alternates: vec![],
            }),
            ..Default::default()
        },
    );
    odds.insert(
        "mlb-total-home-runs-over-8.5-alt".to_string(),
        RawMarket {
            market_name: Some("Total Home Runs".to_string()),
            bet_type_id: Some("ou".to_string()),
            side_id: Some("over".to_string()),
            fanduel: Some(RawBookQuote {
                price: Some(105.0),
                alternates: vec![RawAlternate {
                    line: Some(json!(9.5)),
                    price: Some(140.0),
                }],
            }),
            ..Default::default()
        },
    );
    RawEventOdds {
        event_id: event_id.to_string(),
        odds,
    }
}

fn wager_input(
    id: &str,
    odd_id: &str,
    line: Line,
    bet_type: BetType,
    side: WagerSide,
) -> CreateWager {
    CreateWager {
        id: id.to_string(),
        user_id: "u1".to_string(),
        event_id: "evt-1".to_string(),
        odd_id: odd_id.to_string(),
        line,
        bet_type,
        side,
        stake: 100.0,
        price: -110.0,
        potential_payout: 190.91,
    }
}

async fn ingest_and_finalize(h: &Harness) {
    h.catalog.put(scheduled_event("evt-1"));
    h.feed.put_odds(event_payload("evt-1"));
    let report = h.ingestion.ingest_event("evt-1").await.expect("ingest");
    assert!(report.skipped_reason.is_none());

    h.catalog.finalize("evt-1", 6, 3);
    h.feed.put_results(
        "evt-1",
        vec![
            ("points-home-game-ml-home", 3.0),
            ("mlb-total-home-runs-over-8.5-alt", 9.0),
        ],
    );
}

#[tokio::test]
async fn test_settles_exact_and_drifted_wagers() {
    let h = harness().await;
    ingest_and_finalize(&h).await;

    // tier 1: exact key; home won by 3
    h.wagers
        .create(wager_input(
            "w-exact",
            "points-home-game-ml-home",
            Line::Main,
            BetType::Moneyline,
            WagerSide::Home,
        ))
        .await
        .unwrap();
    // tier 2: the price feed id drifted from the wager's id; 9 home runs
    // clears 8.5
    h.wagers
        .create(wager_input(
            "w-drift",
            "total-home-runs-over-8.5",
            Line::Main,
            BetType::Total,
            WagerSide::Over,
        ))
        .await
        .unwrap();
    // no row matches this one at all
    h.wagers
        .create(wager_input(
            "w-orphan",
            "rbis-SOME_PLAYER_1_MLB-game-ou-over",
            Line::At("2.5".to_string()),
            BetType::Prop,
            WagerSide::Over,
        ))
        .await
        .unwrap();

    let report = h.settlement.settle_event("evt-1").await.expect("settle");
    assert_eq!(report.resolved, 2);
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.already_settled, 0);
    assert!(report.errors.is_empty());

    assert_eq!(h.wagers.get("w-exact").await.unwrap().unwrap().status, "won");
    assert_eq!(h.wagers.get("w-drift").await.unwrap().unwrap().status, "won");
    assert_eq!(
        h.wagers.get("w-orphan").await.unwrap().unwrap().status,
        "pending"
    );
}

#[tokio::test]
async fn test_resettling_is_idempotent() {
    let h = harness().await;
    ingest_and_finalize(&h).await;
    h.wagers
        .create(wager_input(
            "w-exact",
            "points-home-game-ml-home",
            Line::Main,
            BetType::Moneyline,
            WagerSide::Home,
        ))
        .await
        .unwrap();

    let first = h.settlement.settle_event("evt-1").await.expect("settle");
    assert_eq!(first.resolved, 1);
    let settled = h.wagers.get("w-exact").await.unwrap().unwrap();

    let second = h.settlement.settle_event("evt-1").await.expect("resettle");
    assert_eq!(second.resolved, 0);
    assert_eq!(second.unresolved, 0);

    let unchanged = h.wagers.get("w-exact").await.unwrap().unwrap();
    assert_eq!(unchanged.status, settled.status);
    assert_eq!(unchanged.settled_at, settled.settled_at);
}

#[tokio::test]
async fn test_settling_a_non_final_event_is_refused() {
    let h = harness().await;
    h.catalog.put(scheduled_event("evt-1"));

    let err = h.settlement.settle_event("evt-1").await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_settlement_refreshes_linked_strategy_rollups() {
    let h = harness().await;
    ingest_and_finalize(&h).await;

    h.wagers
        .create(wager_input(
            "w-win",
            "points-home-game-ml-home",
            Line::Main,
            BetType::Moneyline,
            WagerSide::Home,
        ))
        .await
        .unwrap();
    h.strategies.link("strat-1", "w-win").await.unwrap();
    // a pending wager on another event keeps the total above the settled count
    h.wagers
        .create(CreateWager {
            event_id: "evt-2".to_string(),
            ..wager_input(
                "w-open",
                "points-home-game-ml-home",
                Line::Main,
                BetType::Moneyline,
                WagerSide::Home,
            )
        })
        .await
        .unwrap();
    h.strategies.link("strat-1", "w-open").await.unwrap();

    h.settlement.settle_event("evt-1").await.expect("settle");

    let rollup = h
        .rollups
        .get_cached("strat-1")
        .await
        .unwrap()
        .expect("rollup written by settlement");
    assert_eq!(rollup.total_bets, 2);
    assert_eq!(rollup.settled_bets, 1);
    assert_eq!(rollup.pending_bets, 1);
    assert_eq!(rollup.winning_bets, 1);
    assert_eq!(rollup.win_rate, 1.0);
}

#[tokio::test]
async fn test_ten_wager_rollup_scenario() {
    let h = harness().await;
    ingest_and_finalize(&h).await;

    // 6 won, 3 lost, 1 pending, all linked to one strategy
    for i in 0..6 {
        let id = format!("w-win-{}", i);
        h.wagers
            .create(wager_input(
                &id,
                "points-home-game-ml-home",
                Line::Main,
                BetType::Moneyline,
                WagerSide::Home,
            ))
            .await
            .unwrap();
        h.strategies.link("strat-1", &id).await.unwrap();
    }
    // unders lose: 9 home runs clears the 8.5 threshold
    for i in 0..3 {
        let id = format!("w-loss-{}", i);
        h.wagers
            .create(wager_input(
                &id,
                "mlb-total-home-runs-over-8.5-alt",
                Line::Main,
                BetType::Total,
                WagerSide::Under,
            ))
            .await
            .unwrap();
        h.strategies.link("strat-1", &id).await.unwrap();
    }
    h.wagers
        .create(CreateWager {
            event_id: "evt-other".to_string(),
            ..wager_input(
                "w-pending",
                "points-home-game-ml-home",
                Line::Main,
                BetType::Moneyline,
                WagerSide::Home,
            )
        })
        .await
        .unwrap();
    h.strategies.link("strat-1", "w-pending").await.unwrap();

    let report = h.settlement.settle_event("evt-1").await.expect("settle");
    assert_eq!(report.resolved, 9);

    let rollup = h.rollups.get_cached("strat-1").await.unwrap().unwrap();
    assert_eq!(rollup.total_bets, 10);
    assert_eq!(rollup.settled_bets, 9);
    assert_eq!(rollup.pending_bets, 1);
    assert_eq!(rollup.winning_bets, 6);
    assert_eq!(rollup.losing_bets, 3);
    assert!((rollup.win_rate - 6.0 / 9.0).abs() < 1e-9);

    // recomputing with no data changes reproduces the same aggregate
    let again = h.rollups.recompute("strat-1").await.unwrap();
    assert_eq!(again.total_bets, rollup.total_bets);
    assert_eq!(again.winning_bets, rollup.winning_bets);
    assert_eq!(again.losing_bets, rollup.losing_bets);
    assert_eq!(again.push_bets, rollup.push_bets);
    assert!((again.roi_percentage - rollup.roi_percentage).abs() < 1e-9);
}
