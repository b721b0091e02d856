use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scoring event the resolver should find a clip for. Supplied by the
/// match-data layer with team names and kickoff time already resolved;
/// immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalInfo {
    pub match_id: u64,
    /// Period-relative match minute.
    pub minute: u32,
    pub home_team: String,
    pub away_team: String,
    /// Which side scored.
    pub is_home_team: bool,
    /// Kickoff timestamp, used to scope the search window.
    pub match_time: DateTime<Utc>,
}

impl GoalInfo {
    pub fn key(&self) -> GoalKey {
        GoalKey { match_id: self.match_id, minute: self.minute }
    }

    pub fn scoring_team(&self) -> &str {
        if self.is_home_team {
            &self.home_team
        } else {
            &self.away_team
        }
    }
}

/// Identity of a resolution request. Two goals with the same key are the
/// same question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GoalKey {
    pub match_id: u64,
    pub minute: u32,
}

impl fmt::Display for GoalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.match_id, self.minute)
    }
}

/// A resolved highlight link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalLink {
    pub match_id: u64,
    pub minute: u32,
    pub url: String,
    pub title: String,
    pub post_url: String,
    pub fetched_at: DateTime<Utc>,
}

impl GoalLink {
    pub fn key(&self) -> GoalKey {
        GoalKey { match_id: self.match_id, minute: self.minute }
    }
}

/// Cached answer for a goal. `NotFound` means "searched, nothing matched"
/// and suppresses re-searching; it is distinct from never having searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionOutcome {
    Found(GoalLink),
    NotFound,
}

impl ResolutionOutcome {
    pub fn link(&self) -> Option<&GoalLink> {
        match self {
            ResolutionOutcome::Found(link) => Some(link),
            ResolutionOutcome::NotFound => None,
        }
    }
}
