use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Id;

/// The configurable part of an election: its name and voting window.
/// These are always set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// Election name.
    pub name: String,
    /// Voting opens at this instant (inclusive).
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// Voting closes after this instant (inclusive).
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
}

impl ElectionConfig {
    /// Create a new configuration, rejecting empty names and windows that
    /// end before they start.
    pub fn new(name: String, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<Self> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::BadRequest("Election name must not be empty".to_string()));
        }
        if start_time > end_time {
            return Err(Error::InvalidWindow {
                start_time,
                end_time,
            });
        }
        Ok(Self {
            name,
            start_time,
            end_time,
        })
    }
}

/// A candidate standing in an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique within the election.
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    pub party: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    /// Where the candidate's picture lives; uploads are handled elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<String>,
}

impl Candidate {
    /// Create a new candidate with a fresh ID.
    pub fn new(
        name: String,
        party: String,
        tagline: Option<String>,
        image_reference: Option<String>,
    ) -> Result<Self> {
        let name = name.trim().to_string();
        let party = party.trim().to_string();
        if name.is_empty() || party.is_empty() {
            return Err(Error::BadRequest(
                "Candidate name and party must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Id::new(),
            name,
            party,
            tagline: tagline.filter(|t| !t.trim().is_empty()),
            image_reference: image_reference.filter(|i| !i.trim().is_empty()),
        })
    }
}

/// Core election data, as stored in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionCore {
    /// `None` until the commissioner configures the election.
    #[serde(default)]
    pub config: Option<ElectionConfig>,
    /// Candidates, in the order they were added.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl ElectionCore {
    /// An unconfigured election with no candidates.
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// A configured election with no candidates yet.
    pub fn configured(config: ElectionConfig) -> Self {
        Self {
            config: Some(config),
            candidates: Vec::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Get a candidate by ID.
    pub fn candidate(&self, candidate_id: Id) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == candidate_id)
    }
}

/// An election from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Election {
    pub fn new(id: Id, election: ElectionCore) -> Self {
        Self { id, election }
    }
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}
