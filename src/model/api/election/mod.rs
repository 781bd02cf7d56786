mod desc;
mod spec;

pub use desc::{CandidateDescription, ElectionDescription};
pub use spec::{CandidateSpec, ElectionSpec};
