use serde::{Deserialize, Serialize};

/// The temporal phase of an election, derived from its configured window and
/// the current time. Never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Name and voting window have not been set yet.
    Unconfigured,
    /// Voting has not opened yet.
    Upcoming,
    /// Voting is open.
    Active,
    /// Voting has closed.
    Completed,
}

impl Phase {
    /// Position of this phase on the dashboard: open elections first, then
    /// upcoming ones, then finished ones, then those still being set up.
    pub fn display_rank(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Upcoming => 1,
            Self::Completed => 2,
            Self::Unconfigured => 3,
        }
    }

    /// Has voting opened at some point, locking the candidate roster?
    pub fn has_opened(self) -> bool {
        matches!(self, Self::Active | Self::Completed)
    }
}
