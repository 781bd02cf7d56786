use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::Phase,
    db::election::{Candidate, Election},
    mongodb::Id,
};
use crate::service::lifecycle::phase;

/// An API-friendly election description, with its phase resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDescription {
    /// Election unique ID.
    pub id: Id,
    /// Election name, once configured.
    pub name: Option<String>,
    /// Voting opens, once configured.
    pub start_time: Option<DateTime<Utc>>,
    /// Voting closes, once configured.
    pub end_time: Option<DateTime<Utc>>,
    /// Phase at the time the description was made.
    pub phase: Phase,
    /// Candidates in roster order.
    pub candidates: Vec<CandidateDescription>,
}

impl ElectionDescription {
    pub fn new(election: Election, now: DateTime<Utc>) -> Self {
        let phase = phase(&election, now);
        let (name, start_time, end_time) = match election.election.config {
            Some(config) => (
                Some(config.name),
                Some(config.start_time),
                Some(config.end_time),
            ),
            None => (None, None, None),
        };
        Self {
            id: election.id,
            name,
            start_time,
            end_time,
            phase,
            candidates: election
                .election
                .candidates
                .into_iter()
                .map(CandidateDescription::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: Id,
    pub name: String,
    pub party: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<String>,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            party: candidate.party,
            tagline: candidate.tagline,
            image_reference: candidate.image_reference,
        }
    }
}
