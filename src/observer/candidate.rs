//! Per-signal tracking state.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a tracked signal is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateState {
    /// Seen, not yet captured
    Tracking,
    /// Captured; terminal for the observer's lifetime
    Captured,
}

impl std::fmt::Display for CandidateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateState::Tracking => write!(f, "tracking"),
            CandidateState::Captured => write!(f, "captured"),
        }
    }
}

/// What the observer knows about one signal key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Title seen on the first observation (may be empty)
    pub title: String,
    /// Most recent extracted stability; `None` when the last event had none
    pub last_stability: Option<f64>,
    /// Highest stability seen so far
    pub max_stability: Option<f64>,
    pub observations: u64,
    pub state: CandidateState,
    /// Id of the pattern captured for this key
    pub pattern_id: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Candidate {
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            last_stability: None,
            max_stability: None,
            observations: 0,
            state: CandidateState::Tracking,
            pattern_id: None,
            first_seen: now,
            last_seen: now,
        }
    }

    /// Records one observation.
    pub fn record(&mut self, stability: Option<f64>, now: DateTime<Utc>) {
        self.observations = self.observations.saturating_add(1);
        self.last_stability = stability;
        self.last_seen = now;
        if let Some(s) = stability {
            self.max_stability = Some(self.max_stability.map_or(s, |m| m.max(s)));
        }
    }

    pub fn is_captured(&self) -> bool {
        self.state == CandidateState::Captured
    }

    pub fn mark_captured(&mut self, pattern_id: impl Into<String>) {
        self.state = CandidateState::Captured;
        self.pattern_id = Some(pattern_id.into());
    }
}
