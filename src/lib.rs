//! Vote-integrity and tallying backend for a single-ballot online voting
//! system.

#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;

use config::{ConfigFairing, StorageFairing};
use logging::LoggerFairing;

/// Assemble the server: configuration, storage and routes.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(StorageFairing)
}

/// A server over the given storage, for route tests.
#[cfg(test)]
pub(crate) fn rocket_for_storage(storage: storage::Storage) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("jwt_secret", "test-secret"))
        .merge(("log_level", "off"));
    let rocket = rocket::custom(figment)
        .mount("/", api::routes())
        .attach(ConfigFairing);
    storage.manage(rocket)
}

/// A fresh, randomly named database on the server at `TEST_DB_URI`, if set.
#[cfg(test)]
pub(crate) async fn test_database() -> Option<mongodb::Database> {
    let uri = std::env::var("TEST_DB_URI").ok()?;
    let client = mongodb::Client::with_uri_str(uri)
        .await
        .expect("valid TEST_DB_URI");
    let random: u32 = rand::random();
    Some(client.database(&format!("test{random}")))
}
