use std::fmt::Display;

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::model::{db::voter::Voter, mongodb::Id};

/// A user of our application, having defined rights.
pub trait User {
    /// The rights of this user type.
    const RIGHTS: Rights;
}

/// Different privilege levels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Rights {
    Voter = 0,
    Commissioner = 1,
    Service = 2,
}

impl Display for Rights {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Commissioner => "commissioner",
                Self::Service => "service",
            }
        )
    }
}

/// An election commissioner. Commissioners are not stored; a commissioner
/// token's subject is the ID of the one election they own.
#[derive(Debug)]
pub enum Commissioner {}

impl Commissioner {
    /// Is the holder of this token the owner of the given election?
    pub fn owns(token_subject: Id, election_id: Id) -> bool {
        token_subject == election_id
    }
}

/// The external authentication service, the only caller allowed to sign
/// commissioners up. The subject of its tokens is not interpreted.
#[derive(Debug)]
pub enum AuthService {}

impl User for AuthService {
    const RIGHTS: Rights = Rights::Service;
}

impl User for Commissioner {
    const RIGHTS: Rights = Rights::Commissioner;
}

impl User for Voter {
    const RIGHTS: Rights = Rights::Voter;
}
