pub mod game_catalog_client;
pub mod odds_feed_client;
