use std::ops::{Deref, DerefMut};

use argon2::Config as Argon2Config;
use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{common::VoteToken, mongodb::Id};

pub const MIN_CREDENTIAL_LENGTH: usize = 8;

/// A vote, as recorded against the voter who cast it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedVote {
    /// The chosen candidate.
    pub candidate_id: Id,
    /// Receipt issued to the voter.
    pub token: VoteToken,
    /// When the vote was recorded.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl RecordedVote {
    /// A vote for the given candidate with a fresh token.
    pub fn new(candidate_id: Id, cast_at: DateTime<Utc>) -> Self {
        Self {
            candidate_id,
            token: VoteToken::random(),
            cast_at,
        }
    }
}

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// The one election this voter may vote in.
    pub election_id: Id,
    pub name: String,
    /// Normalised to lower case; unique per election.
    pub email: String,
    /// Argon2 hash of the credential the voter signs in with.
    pub credential_hash: String,
    /// Whether, for whom, and with which receipt this voter voted.
    /// Written exactly once, by a single atomic update.
    #[serde(default)]
    pub vote: Option<RecordedVote>,
}

impl VoterCore {
    /// Create a new voter who has not voted yet.
    /// This enforces a plausible email address and a minimum credential length.
    pub fn new(election_id: Id, name: String, email: String, credential: &str) -> Result<Self> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::BadRequest("Voter name must not be empty".to_string()));
        }
        let email = normalise_email(&email)
            .ok_or_else(|| Error::BadRequest(format!("Malformed email address '{}'", email)))?;
        if credential.len() < MIN_CREDENTIAL_LENGTH {
            return Err(Error::BadRequest(format!(
                "Credential must be at least {} characters",
                MIN_CREDENTIAL_LENGTH
            )));
        }

        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let credential_hash =
            argon2::hash_encoded(credential.as_bytes(), &salt, &Argon2Config::default())?;

        Ok(Self {
            election_id,
            name,
            email,
            credential_hash,
            vote: None,
        })
    }

    /// Check whether the given credential is correct.
    pub fn verify_credential<T: AsRef<[u8]>>(&self, credential: T) -> Result<bool> {
        Ok(argon2::verify_encoded(
            &self.credential_hash,
            credential.as_ref(),
        )?)
    }

    pub fn has_voted(&self) -> bool {
        self.vote.is_some()
    }

    pub fn voted_for(&self) -> Option<Id> {
        self.vote.as_ref().map(|v| v.candidate_id)
    }

    pub fn vote_token(&self) -> Option<&VoteToken> {
        self.vote.as_ref().map(|v| &v.token)
    }
}

/// Lower-case and trim an email address, rejecting anything without a
/// non-empty local part and domain.
fn normalise_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    let valid = !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);
    valid.then_some(email)
}

/// A voter from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Voter {
    pub fn new(id: Id, voter: VoterCore) -> Self {
        Self { id, voter }
    }
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}
