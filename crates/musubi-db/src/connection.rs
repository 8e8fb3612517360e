//! Connection to the SurrealDB server that holds every Musubi collection.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::run_migrations;

/// Where the document store lives and how to sign in to it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket address, without scheme (`127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "musubi".into(),
            database: "circles".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// An open, migrated SurrealDB session.
///
/// Repositories take their own clone of the session through
/// [`DbManager::handle`]; clones share the underlying connection.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Sign in as root, select the namespace and database, and apply any
    /// pending schema migrations.
    pub async fn connect_and_migrate(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;

        run_migrations(&db).await?;
        info!("SurrealDB ready");

        Ok(Self { db })
    }

    pub fn handle(&self) -> Surreal<Client> {
        self.db.clone()
    }
}
