use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use log::debug;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::mongodb::Id;

use super::user::{Rights, User};

pub const BEARER_PREFIX: &str = "Bearer ";

/// An authentication token representing a specific user with specific rights.
///
/// Tokens are issued by the authentication service and presented in the
/// `Authorization` header. For a voter the subject is their voter ID; for a
/// commissioner it is the ID of the election they own.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthToken<U> {
    #[serde(rename = "sub")]
    pub id: Id,
    #[serde(rename = "rgt")]
    pub rights: Rights,
    #[serde(skip)]
    phantom: PhantomData<U>,
}

impl<U> AuthToken<U> {
    /// Does this token permit the given rights?
    pub fn permits(&self, target: Rights) -> bool {
        self.rights == target
    }
}

impl<U> AuthToken<U>
where
    U: User,
{
    /// Create a new [`AuthToken`] for the given subject, with the rights of this user type.
    pub fn new(id: Id) -> Self {
        Self {
            id,
            rights: U::RIGHTS,
            phantom: PhantomData,
        }
    }

    /// Sign this token, valid for the configured lifetime.
    pub fn encode(self, config: &Config) -> Result<String, Error> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?)
    }

    /// Verify and decode a signed token.
    pub fn decode(token: &str, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<U>>| claims.claims.token)?;
        Ok(token)
    }
}

/// Token claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<U> {
    #[serde(flatten, bound = "")]
    token: AuthToken<U>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r, U> FromRequest<'r> for AuthToken<U>
where
    U: User + Send,
{
    type Error = Error;

    /// Get an [`AuthToken`] from the `Authorization` header and verify that it has the correct
    /// rights for this user type.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => {
                return Outcome::Failure((
                    Status::InternalServerError,
                    Error::Internal("Authentication is not configured".to_string()),
                ))
            }
        };

        let bearer = match req
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix(BEARER_PREFIX))
        {
            Some(bearer) => bearer.trim(),
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::Unauthorized("Missing bearer token".to_string()),
                ))
            }
        };

        let token = match Self::decode(bearer, config) {
            Ok(token) => token,
            Err(err) => {
                debug!("Rejected bearer token: {}", err);
                return Outcome::Failure((Status::Unauthorized, err));
            }
        };

        if !token.permits(U::RIGHTS) {
            return Outcome::Failure((
                Status::Forbidden,
                Error::Forbidden(format!("Token does not grant {} rights", U::RIGHTS)),
            ));
        }

        Outcome::Success(token)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::model::{api::auth::Commissioner, db::voter::Voter};

    fn config() -> Config {
        Config::new("test-secret".to_string(), Duration::minutes(5))
    }

    #[test]
    fn round_trip_keeps_subject_and_rights() {
        let config = config();
        let id = Id::new();
        let signed = AuthToken::<Voter>::new(id).encode(&config).unwrap();
        let token = AuthToken::<Voter>::decode(&signed, &config).unwrap();
        assert_eq!(token.id, id);
        assert_eq!(token.rights, Rights::Voter);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signed = AuthToken::<Commissioner>::new(Id::new())
            .encode(&config())
            .unwrap();
        let other = Config::new("other-secret".to_string(), Duration::minutes(5));
        assert!(AuthToken::<Commissioner>::decode(&signed, &other).is_err());
    }

    #[test]
    fn expired_token_is_unauthorized() {
        // Beyond the default validation leeway of one minute.
        let expired = Config::new("test-secret".to_string(), Duration::minutes(-5));
        let signed = AuthToken::<Voter>::new(Id::new()).encode(&expired).unwrap();
        let err = AuthToken::<Voter>::decode(&signed, &expired).unwrap_err();
        assert_eq!(err.status(), Status::Unauthorized);
    }

    #[test]
    fn rights_are_carried_in_the_token() {
        let config = config();
        let signed = AuthToken::<Commissioner>::new(Id::new())
            .encode(&config)
            .unwrap();
        // Decoding succeeds regardless of the expected type; the guard checks rights.
        let token = AuthToken::<Voter>::decode(&signed, &config).unwrap();
        assert!(!token.permits(Rights::Voter));
        assert!(token.permits(Rights::Commissioner));
    }
}
