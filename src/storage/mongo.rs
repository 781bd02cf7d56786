use chrono::{DateTime, Utc};
use mongodb::{
    bson::{self, doc, to_bson, to_document, Document},
    options::FindOptions,
    Database,
};
use rocket::futures::TryStreamExt;
use serde::Serialize;

use crate::error::Result;
use crate::model::{
    db::{
        election::{Candidate, Election, ElectionConfig},
        voter::{RecordedVote, Voter},
    },
    mongodb::{is_duplicate_key_error, Coll, Counter, Id, MongoCollection},
};

use super::{ElectionBackend, VoterBackend};

/// Options listing documents in insertion order.
fn in_insertion_order() -> FindOptions {
    FindOptions::builder().sort(doc! {"seq": 1}).build()
}

/// Insert `item`, numbered by the counter named after its collection.
/// Returns false if a unique index rejected it.
async fn insert_numbered<T>(coll: &Coll<T>, counters: &Coll<Counter>, item: &T) -> Result<bool>
where
    T: MongoCollection + Serialize + Send + Sync,
{
    let mut document = to_document(item)?;
    document.insert("seq", Counter::next(counters, T::NAME).await?);
    match coll
        .clone_with_type::<Document>()
        .insert_one(document, None)
        .await
    {
        Ok(_) => Ok(true),
        Err(e) if is_duplicate_key_error(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Filter matching the election with the given ID while its voting has not
/// opened by `now`.
fn unopened(id: Id, now: DateTime<Utc>) -> Document {
    doc! {
        "_id": id,
        "$or": [
            { "config": null },
            { "config.start_time": { "$gt": bson::DateTime::from_chrono(now) } },
        ],
    }
}

/// Elections stored in the `elections` collection, one document each, with
/// candidates embedded.
pub struct MongoElections {
    elections: Coll<Election>,
    counters: Coll<Counter>,
}

impl MongoElections {
    pub fn new(db: &Database) -> Self {
        Self {
            elections: Coll::from_db(db),
            counters: Coll::from_db(db),
        }
    }

    /// Apply an update to the election(s) matching `filter`, returning
    /// whether any matched.
    async fn update(&self, filter: Document, update: Document) -> Result<bool> {
        let result = self.elections.update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }
}

#[rocket::async_trait]
impl ElectionBackend for MongoElections {
    async fn insert(&self, election: &Election) -> Result<bool> {
        insert_numbered(&self.elections, &self.counters, election).await
    }

    async fn find(&self, id: Id) -> Result<Option<Election>> {
        Ok(self.elections.find_one(id.as_doc(), None).await?)
    }

    async fn list(&self) -> Result<Vec<Election>> {
        Ok(self
            .elections
            .find(None, in_insertion_order())
            .await?
            .try_collect()
            .await?)
    }

    async fn set_config(
        &self,
        id: Id,
        config: &ElectionConfig,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let update = doc! {
            "$set": {
                "config": to_bson(config)?,
            }
        };
        self.update(unopened(id, now), update).await
    }

    async fn set_config_if_unset(&self, id: Id, config: &ElectionConfig) -> Result<bool> {
        let filter = doc! {
            "_id": id,
            "config": null,
        };
        let update = doc! {
            "$set": {
                "config": to_bson(config)?,
            }
        };
        self.update(filter, update).await
    }

    async fn push_candidate(&self, id: Id, candidate: &Candidate) -> Result<bool> {
        let update = doc! {
            "$push": {
                "candidates": to_bson(candidate)?,
            }
        };
        self.update(id.as_doc(), update).await
    }

    async fn pull_candidate(
        &self,
        id: Id,
        candidate_id: Id,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let update = doc! {
            "$pull": {
                "candidates": { "_id": candidate_id },
            }
        };
        self.update(unopened(id, now), update).await
    }
}

/// Voters stored in the `voters` collection, one document each, with their
/// vote embedded.
pub struct MongoVoters {
    voters: Coll<Voter>,
    counters: Coll<Counter>,
}

impl MongoVoters {
    pub fn new(db: &Database) -> Self {
        Self {
            voters: Coll::from_db(db),
            counters: Coll::from_db(db),
        }
    }
}

#[rocket::async_trait]
impl VoterBackend for MongoVoters {
    async fn insert(&self, voter: &Voter) -> Result<bool> {
        // The unique (election_id, email) index rejects re-registration.
        insert_numbered(&self.voters, &self.counters, voter).await
    }

    async fn find(&self, id: Id) -> Result<Option<Voter>> {
        Ok(self.voters.find_one(id.as_doc(), None).await?)
    }

    async fn find_by_election(&self, election_id: Id) -> Result<Vec<Voter>> {
        let filter = doc! {
            "election_id": election_id,
        };
        Ok(self
            .voters
            .find(filter, in_insertion_order())
            .await?
            .try_collect()
            .await?)
    }

    async fn delete_unvoted(&self, id: Id) -> Result<bool> {
        let filter = doc! {
            "_id": id,
            "vote": null,
        };
        let result = self.voters.delete_one(filter, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn record_vote(&self, id: Id, vote: &RecordedVote) -> Result<bool> {
        // Single-document compare-and-set: only matches while no vote exists.
        let filter = doc! {
            "_id": id,
            "vote": null,
        };
        let update = doc! {
            "$set": {
                "vote": to_bson(vote)?,
            }
        };
        let result = self.voters.update_one(filter, update, None).await?;
        Ok(result.modified_count == 1)
    }
}
