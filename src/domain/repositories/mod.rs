pub mod game_catalog;
pub mod odds_feed;
