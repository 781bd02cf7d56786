use chrono::Duration;
use log::{error, info, warn};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::storage::Storage;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default = "default_auth_ttl")]
    auth_ttl: i64,
    // secrets
    jwt_secret: String,
}

fn default_auth_ttl() -> i64 {
    3600
}

impl Config {
    pub fn new(jwt_secret: String, auth_ttl: Duration) -> Self {
        Self {
            auth_ttl: auth_ttl.num_seconds(),
            jwt_secret,
        }
    }

    /// Valid lifetime of issued auth tokens, in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl)
    }

    /// Secret key shared with the authentication service, used to verify JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Which storage adapter to run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    MongoDb,
    /// Volatile; everything is lost on shutdown.
    Memory,
}

/// Configuration for persistence.
#[derive(Deserialize)]
struct StorageConfig {
    // non-secrets
    #[serde(default)]
    storage: StorageKind,
    #[serde(default = "default_db_name")]
    db_name: String,
    // secrets
    db_uri: Option<String>,
}

fn default_db_name() -> String {
    "voting".to_string()
}

/// A fairing that loads the storage config, connects to the database if
/// needed, performs any setup necessary, and places every core component
/// into managed state.
pub struct StorageFairing;

#[rocket::async_trait]
impl Fairing for StorageFairing {
    fn info(&self) -> Info {
        Info {
            name: "Storage",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StorageConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load storage config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let storage = match config.storage {
            StorageKind::Memory => {
                warn!("Using in-memory storage, nothing will survive a restart");
                Storage::in_memory()
            }
            StorageKind::MongoDb => {
                let Some(db_uri) = config.db_uri else {
                    error!("`db_uri` must be set to use MongoDB storage");
                    return Err(rocket);
                };
                info!("Loaded database config, connecting...");
                let client = match MongoClient::with_uri_str(db_uri).await {
                    Ok(client) => client,
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                };
                let db = client.database(&config.db_name);

                // Ensure the required indexes exist.
                match Storage::mongodb(&db).await {
                    Ok(storage) => {
                        info!("...database connection online!");
                        storage
                    }
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                }
            }
        };

        Ok(storage.manage(rocket))
    }
}
