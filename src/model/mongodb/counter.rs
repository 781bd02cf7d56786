use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

/// A named counter used to number documents in insertion order.
///
/// Object IDs only sort by creation time within one process, and callers may
/// choose IDs themselves, so storage order is kept by an explicit sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub name: String,
    pub next: i64,
}

impl Counter {
    /// Atomically take the next value of the named counter, creating it at 1
    /// if it does not exist yet.
    pub async fn next(counters: &Coll<Counter>, name: &str) -> Result<i64> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": name }, update, options)
            .await?
            .ok_or_else(|| Error::Internal(format!("Failed to take counter '{}'", name)))?;
        Ok(counter.next)
    }
}
