//! Types shared between the database and API representations.

mod phase;
mod token;

pub use phase::Phase;
pub use token::VoteToken;
