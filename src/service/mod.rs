//! The vote-integrity and tallying core.
//!
//! Each component is constructed over injected storage ports and is cheap to
//! clone; Rocket keeps one of each in managed state.

mod ballot_box;
mod elections;
pub mod lifecycle;
mod tally;
mod voters;

pub use ballot_box::BallotBox;
pub use elections::ElectionStore;
pub use tally::{CandidateTally, TallyEngine, TallyResult};
pub use voters::VoterRegistry;
