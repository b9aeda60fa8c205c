//! Settlement matching and outcome derivation.

pub mod matcher;
pub mod outcome;

pub use matcher::{match_wager, MatchResult, MatchTier, UnresolvedReason};
pub use outcome::derive_outcome;
