use chrono::{DateTime, Utc};
use rocket::tokio::sync::RwLock;

use crate::error::Result;
use crate::model::{
    db::{
        election::{Candidate, Election, ElectionConfig},
        voter::{RecordedVote, Voter},
    },
    mongodb::Id,
};

use super::{ElectionBackend, VoterBackend};
use crate::service::lifecycle::phase;

/// Elections held in process memory, in insertion order.
///
/// Lock checks run inside the same write guard as the update they protect.
#[derive(Default)]
pub struct InMemoryElections {
    elections: RwLock<Vec<Election>>,
}

impl InMemoryElections {
    /// Apply `update` to the election with the given ID, if it exists.
    async fn update<F>(&self, id: Id, update: F) -> bool
    where
        F: FnOnce(&mut Election) -> bool,
    {
        let mut elections = self.elections.write().await;
        match elections.iter_mut().find(|e| e.id == id) {
            Some(election) => update(election),
            None => false,
        }
    }
}

#[rocket::async_trait]
impl ElectionBackend for InMemoryElections {
    async fn insert(&self, election: &Election) -> Result<bool> {
        let mut elections = self.elections.write().await;
        if elections.iter().any(|e| e.id == election.id) {
            return Ok(false);
        }
        elections.push(election.clone());
        Ok(true)
    }

    async fn find(&self, id: Id) -> Result<Option<Election>> {
        let elections = self.elections.read().await;
        Ok(elections.iter().find(|e| e.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Election>> {
        Ok(self.elections.read().await.clone())
    }

    async fn set_config(
        &self,
        id: Id,
        config: &ElectionConfig,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self
            .update(id, |election| {
                if phase(election, now).has_opened() {
                    return false;
                }
                election.config = Some(config.clone());
                true
            })
            .await)
    }

    async fn set_config_if_unset(&self, id: Id, config: &ElectionConfig) -> Result<bool> {
        Ok(self
            .update(id, |election| {
                if election.is_configured() {
                    return false;
                }
                election.config = Some(config.clone());
                true
            })
            .await)
    }

    async fn push_candidate(&self, id: Id, candidate: &Candidate) -> Result<bool> {
        Ok(self
            .update(id, |election| {
                election.candidates.push(candidate.clone());
                true
            })
            .await)
    }

    async fn pull_candidate(
        &self,
        id: Id,
        candidate_id: Id,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self
            .update(id, |election| {
                if phase(election, now).has_opened() {
                    return false;
                }
                election.candidates.retain(|c| c.id != candidate_id);
                true
            })
            .await)
    }
}

/// Voters held in process memory, in registration order.
///
/// Every conditional write holds the write lock across its check and its
/// update, so the pair is atomic with respect to all other callers.
#[derive(Default)]
pub struct InMemoryVoters {
    voters: RwLock<Vec<Voter>>,
}

#[rocket::async_trait]
impl VoterBackend for InMemoryVoters {
    async fn insert(&self, voter: &Voter) -> Result<bool> {
        let mut voters = self.voters.write().await;
        let taken = voters
            .iter()
            .any(|v| v.election_id == voter.election_id && v.email == voter.email);
        if taken {
            return Ok(false);
        }
        voters.push(voter.clone());
        Ok(true)
    }

    async fn find(&self, id: Id) -> Result<Option<Voter>> {
        let voters = self.voters.read().await;
        Ok(voters.iter().find(|v| v.id == id).cloned())
    }

    async fn find_by_election(&self, election_id: Id) -> Result<Vec<Voter>> {
        let voters = self.voters.read().await;
        Ok(voters
            .iter()
            .filter(|v| v.election_id == election_id)
            .cloned()
            .collect())
    }

    async fn delete_unvoted(&self, id: Id) -> Result<bool> {
        let mut voters = self.voters.write().await;
        match voters.iter().position(|v| v.id == id && !v.has_voted()) {
            Some(index) => {
                voters.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_vote(&self, id: Id, vote: &RecordedVote) -> Result<bool> {
        let mut voters = self.voters.write().await;
        match voters.iter_mut().find(|v| v.id == id) {
            Some(voter) if !voter.has_voted() => {
                voter.vote = Some(vote.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
