pub mod ingestion_service;
pub mod odds_writer;
pub mod rollup_service;
pub mod settlement_service;
