use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::database::memory::MemoryStore;
use crate::database::postgres::{PgContactRepository, PgUserRepository};
use crate::database::repository::{ContactRepository, UserRepository};
use crate::database::schema;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Maps a unique-constraint violation to `Conflict`, anything else to `Sqlx`.
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::Conflict(what.to_string()),
            _ => DatabaseError::Sqlx(err),
        }
    }
}

enum Backend {
    Postgres(PgPool),
    Memory,
}

/// Owns the connection pool (or memory store) and hands out the repositories built on it.
#[derive(Clone)]
pub struct DatabaseManager {
    backend: Arc<Backend>,
    users: Arc<dyn UserRepository>,
    contacts: Arc<dyn ContactRepository>,
}

impl DatabaseManager {
    /// Connects to the configured backend. Postgres pools have the schema applied
    /// before they are handed out.
    pub async fn connect(backend: &DatabaseBackend, config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        match backend {
            DatabaseBackend::Postgres(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(Duration::from_secs(config.connection_timeout))
                    .connect(url)
                    .await
                    .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

                schema::migrate(&pool).await?;
                info!("Connected to PostgreSQL (max {} connections)", config.max_connections);
                Ok(Self::postgres(pool))
            }
            DatabaseBackend::Memory => {
                warn!("Using the in-memory store; data is lost when the process exits");
                Ok(Self::memory())
            }
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            contacts: Arc::new(PgContactRepository::new(pool.clone())),
            backend: Arc::new(Backend::Postgres(pool)),
        }
    }

    pub fn memory() -> Self {
        let store = MemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            contacts: Arc::new(store),
            backend: Arc::new(Backend::Memory),
        }
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        Arc::clone(&self.users)
    }

    pub fn contacts(&self) -> Arc<dyn ContactRepository> {
        Arc::clone(&self.contacts)
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend.as_ref() {
            Backend::Postgres(_) => "postgres",
            Backend::Memory => "memory",
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match self.backend.as_ref() {
            Backend::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Backend::Memory => Ok(()),
        }
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        if let Backend::Postgres(pool) = self.backend.as_ref() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
