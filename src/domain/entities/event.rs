use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a game as reported by the event catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Scheduled,
    Started,
    Live,
    Final,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Started => "started",
            EventStatus::Live => "live",
            EventStatus::Final => "final",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(EventStatus::Scheduled),
            "started" => Ok(EventStatus::Started),
            "live" | "in_progress" => Ok(EventStatus::Live),
            "final" | "completed" => Ok(EventStatus::Final),
            other => Err(format!("Unknown event status: {}", other)),
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a game from the event catalog. Read-only to this core except
/// that the final score is consumed once finality is observed.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub starts_at: DateTime<Utc>,
    pub status: EventStatus,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

impl Event {
    /// Cutoff rule for current-store writes: any non-scheduled status, or a
    /// scheduled start time at or before `now`, counts as started.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.status != EventStatus::Scheduled || self.starts_at <= now
    }

    pub fn is_final(&self) -> bool {
        self.status == EventStatus::Final
    }
}
