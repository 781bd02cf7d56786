use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::db::election::{Candidate, ElectionConfig};

/// The name and voting window of an election, as submitted by its commissioner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl TryFrom<ElectionSpec> for ElectionConfig {
    type Error = Error;

    fn try_from(spec: ElectionSpec) -> Result<Self, Self::Error> {
        ElectionConfig::new(spec.name, spec.start_time, spec.end_time)
    }
}

/// A candidate to add to an election.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    pub party: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub image_reference: Option<String>,
}

impl TryFrom<CandidateSpec> for Candidate {
    type Error = Error;

    /// Convert a spec into a candidate with a fresh ID.
    fn try_from(spec: CandidateSpec) -> Result<Self, Self::Error> {
        Candidate::new(spec.name, spec.party, spec.tagline, spec.image_reference)
    }
}
