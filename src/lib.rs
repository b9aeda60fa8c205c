//! Linekeeper Library
//!
//! Core components of the odds ingestion, deduplication and wager-settlement
//! pipeline: canonicalization of upstream market payloads, dual-table odds
//! writes, tiered settlement matching, and strategy rollup recomputation.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
pub mod rate_limit;
