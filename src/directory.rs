//! Authoritative store of connection lifecycle state.
//!
//! The active set is always read from here. Nothing in the crate keeps a
//! copy of it between events: several isolated handlers may be running at
//! once and any of them can be the first to see a new connection.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db;
use crate::error::DirectoryError;
use crate::models::connection::Connection;

#[async_trait]
pub trait ConnectionDirectory: Send + Sync {
    /// Every connection added and not yet closed. Must observe writes that
    /// completed before the call.
    async fn list_active(&self) -> Result<Vec<String>, DirectoryError>;

    /// Idempotent upsert with status `active`.
    async fn add(&self, connection_id: &str) -> Result<(), DirectoryError>;

    /// Idempotent transition to `closed`. Later calls change nothing.
    async fn mark_closed(&self, connection_id: &str) -> Result<(), DirectoryError>;

    async fn get(&self, connection_id: &str) -> Result<Option<Connection>, DirectoryError>;

    /// Releases the underlying client.
    async fn close(&self) {}
}

/// SQLite-backed directory.
#[derive(Clone)]
pub struct SqlDirectory {
    pool: SqlitePool,
}

impl SqlDirectory {
    pub async fn connect(database_url: &str) -> Result<Self, DirectoryError> {
        let pool = db::create_pool(database_url).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ConnectionDirectory for SqlDirectory {
    async fn list_active(&self) -> Result<Vec<String>, DirectoryError> {
        Ok(db::connections::list_active_ids(&self.pool).await?)
    }

    async fn add(&self, connection_id: &str) -> Result<(), DirectoryError> {
        db::connections::add_connection(&self.pool, connection_id).await?;
        Ok(())
    }

    async fn mark_closed(&self, connection_id: &str) -> Result<(), DirectoryError> {
        if !db::connections::mark_closed(&self.pool, connection_id).await? {
            tracing::debug!(connection_id, "connection already closed or unknown");
        }
        Ok(())
    }

    async fn get(&self, connection_id: &str) -> Result<Option<Connection>, DirectoryError> {
        Ok(db::connections::get_connection(&self.pool, connection_id).await?)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
