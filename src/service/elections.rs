use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    db::election::{Candidate, Election, ElectionConfig, ElectionCore},
    mongodb::Id,
};
use crate::storage::ElectionBackend;

/// Durable record of elections and their candidate rosters.
#[derive(Clone)]
pub struct ElectionStore {
    elections: Arc<dyn ElectionBackend>,
}

impl ElectionStore {
    pub fn new(elections: Arc<dyn ElectionBackend>) -> Self {
        Self { elections }
    }

    /// Create a configured election with no candidates.
    pub async fn create(
        &self,
        name: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Id> {
        let config = ElectionConfig::new(name, start_time, end_time)?;
        self.insert_fresh(ElectionCore::configured(config)).await
    }

    /// Create an unconfigured election, as done when a commissioner registers.
    pub async fn create_placeholder(&self) -> Result<Id> {
        self.insert_fresh(ElectionCore::placeholder()).await
    }

    async fn insert_fresh(&self, election: ElectionCore) -> Result<Id> {
        let election = Election::new(Id::new(), election);
        if !self.elections.insert(&election).await? {
            return Err(Error::DuplicateConfiguration(election.id));
        }
        info!("Created election {}", election.id);
        Ok(election.id)
    }

    /// Create an election under a caller-chosen ID.
    ///
    /// An existing unconfigured election with that ID is configured in place.
    /// An existing configured one is left untouched and the call fails with
    /// [`Error::DuplicateConfiguration`].
    pub async fn create_with_id(&self, id: Id, config: ElectionConfig) -> Result<()> {
        if self.elections.find(id).await?.is_none() {
            let election = Election::new(id, ElectionCore::configured(config.clone()));
            if self.elections.insert(&election).await? {
                info!("Created election {}", id);
                return Ok(());
            }
            // Lost a race with another insert; fall through and treat it as existing.
        }
        if self.elections.set_config_if_unset(id, &config).await? {
            info!("Configured election {}", id);
            Ok(())
        } else {
            Err(Error::DuplicateConfiguration(id))
        }
    }

    /// Set or replace the name and voting window of an election. Once voting
    /// has opened the configuration is frozen; repeating it unchanged is
    /// still accepted.
    pub async fn configure(&self, id: Id, config: ElectionConfig) -> Result<Election> {
        self.configure_at(id, config, Utc::now()).await
    }

    pub async fn configure_at(
        &self,
        id: Id,
        config: ElectionConfig,
        now: DateTime<Utc>,
    ) -> Result<Election> {
        if !self.elections.set_config(id, &config, now).await? {
            let election = self.get(id).await?;
            if election.config.as_ref() == Some(&config) {
                return Ok(election);
            }
            return Err(Error::ElectionLocked(id));
        }
        info!(
            "Configured election {} ({} to {})",
            id, config.start_time, config.end_time
        );
        self.get(id).await
    }

    /// Append a candidate to the roster, returning the candidate's ID.
    pub async fn add_candidate(&self, id: Id, candidate: Candidate) -> Result<Id> {
        if !self.elections.push_candidate(id, &candidate).await? {
            return Err(not_found(id));
        }
        debug!("Added candidate {} to election {}", candidate.id, id);
        Ok(candidate.id)
    }

    /// Remove a candidate from the roster, if present. Rosters are frozen once
    /// voting opens.
    pub async fn remove_candidate(&self, id: Id, candidate_id: Id) -> Result<()> {
        self.remove_candidate_at(id, candidate_id, Utc::now()).await
    }

    pub async fn remove_candidate_at(
        &self,
        id: Id,
        candidate_id: Id,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.elections.pull_candidate(id, candidate_id, now).await? {
            // Either there is no such election, or its roster is frozen.
            self.get(id).await?;
            return Err(Error::CandidateLocked(id));
        }
        debug!("Removed candidate {} from election {}", candidate_id, id);
        Ok(())
    }

    /// Get an election by ID.
    pub async fn get(&self, id: Id) -> Result<Election> {
        self.elections.find(id).await?.ok_or_else(|| not_found(id))
    }

    /// All elections, in storage order.
    pub async fn list(&self) -> Result<Vec<Election>> {
        self.elections.list().await
    }
}

fn not_found(id: Id) -> Error {
    Error::not_found(format!("Election with ID '{}'", id))
}
