use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    db::{election::Election, voter::Voter},
    mongodb::Id,
};
use crate::storage::{ElectionBackend, VoterBackend};

/// Vote count for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub candidate_id: Id,
    pub name: String,
    pub party: String,
    pub votes: u64,
    /// Share of all votes cast, as a percentage rounded to one decimal place.
    pub percentage: f64,
}

/// Results of an election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyResult {
    pub election_id: Id,
    pub total_votes: u64,
    /// Every candidate on the roster, most votes first. Ties keep roster order.
    pub candidates: Vec<CandidateTally>,
}

impl TallyResult {
    /// Count the votes of an election's voters.
    pub fn compute(election: &Election, voters: &[Voter]) -> Self {
        let mut counts: HashMap<Id, u64> = HashMap::new();
        for candidate_id in voters.iter().filter_map(|v| v.voted_for()) {
            *counts.entry(candidate_id).or_default() += 1;
        }
        let total_votes = voters.iter().filter(|v| v.has_voted()).count() as u64;

        let mut candidates: Vec<CandidateTally> = election
            .candidates
            .iter()
            .map(|candidate| {
                let votes = counts.get(&candidate.id).copied().unwrap_or(0);
                CandidateTally {
                    candidate_id: candidate.id,
                    name: candidate.name.clone(),
                    party: candidate.party.clone(),
                    votes,
                    percentage: percentage(votes, total_votes),
                }
            })
            .collect();
        // Stable, so ties stay in roster order.
        candidates.sort_by(|a, b| b.votes.cmp(&a.votes));

        Self {
            election_id: election.id,
            total_votes,
            candidates,
        }
    }

    /// The candidates sharing the highest count. Empty if nobody has voted.
    pub fn leaders(&self) -> Vec<&CandidateTally> {
        match self.candidates.first() {
            Some(top) if top.votes > 0 => self
                .candidates
                .iter()
                .take_while(|c| c.votes == top.votes)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Share of `total` as a percentage to one decimal place, halves rounded to
/// even.
fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (votes as f64 * 1000.0 / total as f64).round_ties_even() / 10.0
}

/// Counts votes on demand. Results are always derived, never stored.
#[derive(Clone)]
pub struct TallyEngine {
    voters: Arc<dyn VoterBackend>,
    elections: Arc<dyn ElectionBackend>,
}

impl TallyEngine {
    pub fn new(voters: Arc<dyn VoterBackend>, elections: Arc<dyn ElectionBackend>) -> Self {
        Self { voters, elections }
    }

    /// Tally an election as it stands. Available in any phase.
    pub async fn tally(&self, election_id: Id) -> Result<TallyResult> {
        let election = self
            .elections
            .find(election_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election with ID '{}'", election_id)))?;
        let voters = self.voters.find_by_election(election_id).await?;
        let result = TallyResult::compute(&election, &voters);
        debug!(
            "Tallied election {}: {} votes over {} candidates",
            election_id,
            result.total_votes,
            result.candidates.len()
        );
        Ok(result)
    }
}
