use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use super::Counter;
use crate::model::db::{election::Election, voter::Voter};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Election collection
const ELECTIONS: &str = "elections";
impl MongoCollection for Election {
    const NAME: &'static str = ELECTIONS;
}

// Voter collection
const VOTERS: &str = "voters";
impl MongoCollection for Voter {
    const NAME: &'static str = VOTERS;
}

// Counter collection
const COUNTERS: &str = "counters";
impl MongoCollection for Counter {
    const NAME: &'static str = COUNTERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // A voter may only register once per election.
    let voter_email_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "email": 1})
        .options(unique.clone())
        .build();
    Coll::<Voter>::from_db(db)
        .create_index(voter_email_index, None)
        .await?;

    // Vote tokens are never reused. Sparse, since voters who have not yet
    // voted have no token.
    let token_index = IndexModel::builder()
        .keys(doc! {"vote.token": 1})
        .options(IndexOptions::builder().unique(true).sparse(true).build())
        .build();
    Coll::<Voter>::from_db(db)
        .create_index(token_index, None)
        .await?;

    // Tallies and dashboards scan voters by election, in registration order.
    let voter_election_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "seq": 1})
        .build();
    Coll::<Voter>::from_db(db)
        .create_index(voter_election_index, None)
        .await?;

    // Elections are listed in creation order.
    let election_order_index = IndexModel::builder().keys(doc! {"seq": 1}).build();
    Coll::<Election>::from_db(db)
        .create_index(election_order_index, None)
        .await?;

    Ok(())
}
