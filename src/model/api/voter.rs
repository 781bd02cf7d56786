use serde::{Deserialize, Serialize};

use crate::model::{db::voter::Voter, mongodb::Id};

/// Details of a voter to enrol. The credential is plaintext and is hashed
/// before anything is stored.
#[derive(Clone, Deserialize, Serialize)]
pub struct VoterRegistration {
    pub name: String,
    pub email: String,
    pub credential: String,
}

/// A voter as shown to their commissioner. Omits the credential hash and who
/// they voted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterDescription {
    pub id: Id,
    pub election_id: Id,
    pub name: String,
    pub email: String,
    pub has_voted: bool,
}

impl From<Voter> for VoterDescription {
    fn from(voter: Voter) -> Self {
        Self {
            id: voter.id,
            has_voted: voter.has_voted(),
            election_id: voter.voter.election_id,
            name: voter.voter.name,
            email: voter.voter.email,
        }
    }
}
