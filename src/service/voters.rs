use std::sync::Arc;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    db::voter::{Voter, VoterCore},
    mongodb::Id,
};
use crate::storage::{ElectionBackend, VoterBackend};

/// The electorate of every election.
#[derive(Clone)]
pub struct VoterRegistry {
    voters: Arc<dyn VoterBackend>,
    elections: Arc<dyn ElectionBackend>,
}

impl VoterRegistry {
    pub fn new(voters: Arc<dyn VoterBackend>, elections: Arc<dyn ElectionBackend>) -> Self {
        Self { voters, elections }
    }

    /// Enrol a voter in an election. The credential is hashed before storage.
    pub async fn register(
        &self,
        election_id: Id,
        name: String,
        email: String,
        credential: &str,
    ) -> Result<Id> {
        if self.elections.find(election_id).await?.is_none() {
            return Err(Error::not_found(format!(
                "Election with ID '{}'",
                election_id
            )));
        }

        let voter = Voter::new(
            Id::new(),
            VoterCore::new(election_id, name, email, credential)?,
        );
        if !self.voters.insert(&voter).await? {
            return Err(Error::DuplicateVoter {
                election: election_id,
                email: voter.voter.email,
            });
        }
        info!("Registered voter {} in election {}", voter.id, election_id);
        Ok(voter.id)
    }

    /// Remove a voter who has not voted. Voters who have voted are permanent.
    pub async fn remove(&self, voter_id: Id) -> Result<()> {
        if self.voters.delete_unvoted(voter_id).await? {
            debug!("Removed voter {}", voter_id);
            return Ok(());
        }
        match self.voters.find(voter_id).await? {
            Some(_) => Err(Error::VoterLocked(voter_id)),
            None => Err(Error::VoterNotFound(voter_id)),
        }
    }

    /// Get a voter by ID.
    pub async fn get(&self, voter_id: Id) -> Result<Voter> {
        self.voters
            .find(voter_id)
            .await?
            .ok_or(Error::VoterNotFound(voter_id))
    }

    /// Every voter of an election, in registration order.
    pub async fn list_by_election(&self, election_id: Id) -> Result<Vec<Voter>> {
        self.voters.find_by_election(election_id).await
    }
}
