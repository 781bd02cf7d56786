//! Persistence ports and their adapters.
//!
//! Every durable component reaches its store through one of the port traits
//! below. The adapters are constructed once at launch and injected; nothing
//! holds an ambient connection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mongodb::{error::Error as DbError, Database};
use rocket::{Build, Rocket};

use crate::error::Result;
use crate::model::{
    db::{
        election::{Candidate, Election, ElectionConfig},
        voter::{RecordedVote, Voter},
    },
    mongodb::Id,
};
use crate::service::{BallotBox, ElectionStore, TallyEngine, VoterRegistry};

mod memory;
mod mongo;

pub use memory::{InMemoryElections, InMemoryVoters};
pub use mongo::{MongoElections, MongoVoters};

/// Election persistence port.
#[rocket::async_trait]
pub trait ElectionBackend: Send + Sync {
    /// Insert a new election. Returns false if the ID is already taken.
    async fn insert(&self, election: &Election) -> Result<bool>;

    /// Get an election by ID.
    async fn find(&self, id: Id) -> Result<Option<Election>>;

    /// All elections, in storage order.
    async fn list(&self) -> Result<Vec<Election>>;

    /// Overwrite the configuration, unless voting had opened by `now`.
    /// Returns false if there is no such election or it is locked.
    async fn set_config(&self, id: Id, config: &ElectionConfig, now: DateTime<Utc>)
        -> Result<bool>;

    /// Set the configuration only if the election is still unconfigured.
    /// Returns false if there is no such election or it is already configured.
    async fn set_config_if_unset(&self, id: Id, config: &ElectionConfig) -> Result<bool>;

    /// Append a candidate. Returns false if there is no such election.
    async fn push_candidate(&self, id: Id, candidate: &Candidate) -> Result<bool>;

    /// Remove the candidate with the given ID, if present, unless voting had
    /// opened by `now`. Returns false if there is no such election or it is
    /// locked.
    async fn pull_candidate(&self, id: Id, candidate_id: Id, now: DateTime<Utc>)
        -> Result<bool>;
}

/// Voter persistence port.
#[rocket::async_trait]
pub trait VoterBackend: Send + Sync {
    /// Insert a new voter. Returns false if the email is already registered
    /// for the voter's election.
    async fn insert(&self, voter: &Voter) -> Result<bool>;

    /// Get a voter by ID.
    async fn find(&self, id: Id) -> Result<Option<Voter>>;

    /// All voters of an election, in registration order.
    async fn find_by_election(&self, election_id: Id) -> Result<Vec<Voter>>;

    /// Delete a voter, but only if they have not voted.
    /// Returns false if nothing was deleted.
    async fn delete_unvoted(&self, id: Id) -> Result<bool>;

    /// Atomically record a vote, but only if the voter has not voted yet.
    /// Returns false if nothing was recorded.
    async fn record_vote(&self, id: Id, vote: &RecordedVote) -> Result<bool>;
}

/// The storage adapters in use, shared by all components.
#[derive(Clone)]
pub struct Storage {
    elections: Arc<dyn ElectionBackend>,
    voters: Arc<dyn VoterBackend>,
}

impl Storage {
    /// Volatile in-process storage.
    pub fn in_memory() -> Self {
        Self {
            elections: Arc::new(InMemoryElections::default()),
            voters: Arc::new(InMemoryVoters::default()),
        }
    }

    /// MongoDB storage on the given database, creating any missing indexes.
    pub async fn mongodb(db: &Database) -> std::result::Result<Self, DbError> {
        crate::model::mongodb::ensure_indexes_exist(db).await?;
        Ok(Self {
            elections: Arc::new(MongoElections::new(db)),
            voters: Arc::new(MongoVoters::new(db)),
        })
    }

    pub fn election_store(&self) -> ElectionStore {
        ElectionStore::new(self.elections.clone())
    }

    pub fn voter_registry(&self) -> VoterRegistry {
        VoterRegistry::new(self.voters.clone(), self.elections.clone())
    }

    pub fn ballot_box(&self) -> BallotBox {
        BallotBox::new(self.voters.clone(), self.elections.clone())
    }

    pub fn tally_engine(&self) -> TallyEngine {
        TallyEngine::new(self.voters.clone(), self.elections.clone())
    }

    /// Place every component into Rocket's managed state.
    pub fn manage(self, rocket: Rocket<Build>) -> Rocket<Build> {
        rocket
            .manage(self.election_store())
            .manage(self.voter_registry())
            .manage(self.ballot_box())
            .manage(self.tally_engine())
            .manage(self)
    }
}
