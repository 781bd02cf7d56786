use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::db::{election::Election, voter::Voter};

use super::election::ElectionDescription;

/// A commissioner's overview of their election and its turnout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    /// The election, its phase and its candidates.
    #[serde(flatten)]
    pub election: ElectionDescription,
    /// Number of registered voters.
    pub total_voters: u64,
    /// Number of those who have voted.
    pub votes_cast: u64,
}

impl Dashboard {
    /// Summarise an election given its full voter list.
    pub fn new(election: Election, voters: &[Voter], now: DateTime<Utc>) -> Self {
        Self {
            election: ElectionDescription::new(election, now),
            total_voters: voters.len() as u64,
            votes_cast: voters.iter().filter(|v| v.has_voted()).count() as u64,
        }
    }
}
