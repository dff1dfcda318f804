use chrono::{SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::models::connection::{Connection, ConnectionStatus};

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn row_to_connection(row: sqlx::sqlite::SqliteRow) -> Connection {
    let status: String = row.get("status");
    Connection {
        connection_id: row.get("connectionid"),
        created_at: row.get("creationts"),
        disconnected_at: row.get("disconnectts"),
        status: ConnectionStatus::from_db(&status),
    }
}

/// Registers a connection as active. Re-adding a known id leaves the existing
/// record untouched, so a closed connection is never reopened.
pub async fn add_connection(pool: &SqlitePool, connection_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO connections (connectionid, creationts, status)
         VALUES (?, ?, ?)
         ON CONFLICT(connectionid) DO NOTHING",
    )
    .bind(connection_id)
    .bind(now())
    .bind(ConnectionStatus::Active.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns `true` when this call performed the active -> closed transition.
pub async fn mark_closed(pool: &SqlitePool, connection_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE connections SET status = ?, disconnectts = ?
         WHERE connectionid = ? AND status = ?",
    )
    .bind(ConnectionStatus::Closed.as_str())
    .bind(now())
    .bind(connection_id)
    .bind(ConnectionStatus::Active.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_active_ids(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT connectionid FROM connections WHERE status = ? ORDER BY creationts, connectionid",
    )
    .bind(ConnectionStatus::Active.as_str())
    .fetch_all(pool)
    .await
}

pub async fn get_connection(
    pool: &SqlitePool,
    connection_id: &str,
) -> Result<Option<Connection>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT connectionid, creationts, disconnectts, status FROM connections WHERE connectionid = ?",
    )
    .bind(connection_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_connection))
}
