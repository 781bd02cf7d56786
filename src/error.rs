use argon2::Error as Argon2Error;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{debug, error};
use mongodb::{bson::ser::Error as BsonError, error::Error as DbError};
use rocket::{
    http::Status,
    response::{status::Custom, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;

use crate::logging::RequestId;
use crate::model::{common::Phase, mongodb::Id};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Bson(#[from] BsonError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No voter found with ID {0}")]
    VoterNotFound(Id),
    #[error("Voter {0} has already voted")]
    AlreadyVoted(Id),
    #[error("Voter {0} has not voted yet")]
    NotVoted(Id),
    #[error("Candidate {candidate} does not stand in election {election}")]
    InvalidCandidate { election: Id, candidate: Id },
    #[error("Election {election} is not open for voting: {phase:?}")]
    ElectionNotOpen { election: Id, phase: Phase },
    #[error("'{email}' is already registered to vote in election {election}")]
    DuplicateVoter { election: Id, email: String },
    #[error("Election {0} is already configured")]
    DuplicateConfiguration(Id),
    #[error("Voting window ends ({end_time}) before it starts ({start_time})")]
    InvalidWindow {
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },
    #[error("Candidates of election {0} cannot be removed once voting has opened")]
    CandidateLocked(Id),
    #[error("Election {0} cannot be reconfigured once voting has opened")]
    ElectionLocked(Id),
    #[error("Voter {0} has voted and cannot be removed")]
    VoterLocked(Id),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Bson(_) | Self::Argon2(_) | Self::Internal(_) => {
                Status::InternalServerError
            }
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::NotFound(_) | Self::VoterNotFound(_) | Self::NotVoted(_) => Status::NotFound,
            Self::AlreadyVoted(_)
            | Self::DuplicateVoter { .. }
            | Self::DuplicateConfiguration(_)
            | Self::CandidateLocked(_)
            | Self::ElectionLocked(_)
            | Self::VoterLocked(_) => Status::Conflict,
            Self::ElectionNotOpen { .. } | Self::Forbidden(_) => Status::Forbidden,
            Self::InvalidCandidate { .. } | Self::InvalidWindow { .. } | Self::BadRequest(_) => {
                Status::BadRequest
            }
            Self::Unauthorized(_) => Status::Unauthorized,
        }
    }
}

/// Body of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let id = req.local_cache(RequestId::next);
        // Internal details stay in the log.
        let message = if status.code >= 500 {
            error!("req{id} failed: {self}");
            status.reason_lossy().to_string()
        } else {
            debug!("req{id} rejected: {self}");
            self.to_string()
        };
        Custom(status, Json(ErrorBody { error: message })).respond_to(req)
    }
}
