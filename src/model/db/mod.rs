//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - Datetimes are serialised in MongoDB's own format.
//! - Primary keys are named `_id`.

pub mod election;
pub mod voter;
