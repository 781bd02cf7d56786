use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{common::VoteToken, db::voter::RecordedVote, mongodb::Id};

/// A request to cast a vote. The voter is identified by their token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub candidate_id: Id,
}

/// Proof that a vote was recorded, handed back to the voter who cast it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub voter_id: Id,
    pub candidate_id: Id,
    pub vote_token: VoteToken,
    /// When the vote was recorded.
    pub timestamp: DateTime<Utc>,
}

impl VoteReceipt {
    pub fn new(voter_id: Id, vote: &RecordedVote) -> Self {
        Self {
            voter_id,
            candidate_id: vote.candidate_id,
            vote_token: vote.token.clone(),
            timestamp: vote.cast_at,
        }
    }
}
