use std::fmt::{Display, Formatter};
use std::str::FromStr;

use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};

/// An opaque unique identifier for an election, candidate, or voter.
///
/// Identifiers are generated as MongoDB object IDs, but are always stored and
/// exchanged in their 24-digit hex form, so that the database documents and
/// the JSON API agree on a single representation.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Id(ObjectId);

impl Id {
    /// Generate a fresh unique ID.
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// A filter document matching this ID as a primary key.
    pub fn as_doc(&self) -> Document {
        doc! {
            "_id": *self,
        }
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for Id {
    type Err = mongodb::bson::oid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ObjectId::parse_str(s)?))
    }
}

impl TryFrom<String> for Id {
    type Error = mongodb::bson::oid::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.to_string()
    }
}

impl From<Id> for Bson {
    fn from(id: Id) -> Self {
        Bson::String(id.to_string())
    }
}

impl<'a> FromParam<'a> for Id {
    type Error = mongodb::bson::oid::Error;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse::<Id>()
    }
}

impl UriDisplay<Path> for Id {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
        formatter.write_value(self.to_string())
    }
}

impl_from_uri_param_identity!([Path] Id);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_parse_back() {
        let a = Id::new();
        let b = Id::new();
        assert_ne!(a, b);
        assert_eq!(a, a.to_string().parse::<Id>().unwrap());
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!("".parse::<Id>().is_err());
        assert!("not-an-id".parse::<Id>().is_err());
        assert!("0123456789abcdef0123456".parse::<Id>().is_err());
    }

    #[test]
    fn ids_are_stored_as_strings() {
        let id = Id::new();
        assert_eq!(Bson::from(id), Bson::String(id.to_string()));
        assert_eq!(id.as_doc().get_str("_id").unwrap(), id.to_string());
    }
}
