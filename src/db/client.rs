use sqlx::mysql::{MySqlConnection, MySqlPool, MySqlRow};
use sqlx::Row;

use crate::models::{Client, PositionedClient};

const CLIENT_COLUMNS: &str =
    "id, collector_id, full_name, phone, payout_position, is_active, joined_at";

fn row_to_client(row: &MySqlRow) -> Client {
    Client {
        id: row.get("id"),
        collector_id: row.get("collector_id"),
        full_name: row.get("full_name"),
        phone: row.get("phone"),
        payout_position: row.get("payout_position"),
        is_active: row.get("is_active"),
        joined_at: row.get("joined_at"),
    }
}

/// Get a client by ID
pub async fn get_by_id(pool: &MySqlPool, client_id: &str) -> Result<Option<Client>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {} FROM clients WHERE id = ?", CLIENT_COLUMNS))
        .bind(client_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| row_to_client(&r)))
}

/// Get a client by ID, scoped to the owning collector
pub async fn get_for_collector(
    pool: &MySqlPool,
    client_id: &str,
    collector_id: &str,
) -> Result<Option<Client>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM clients WHERE id = ? AND collector_id = ?",
        CLIENT_COLUMNS
    ))
    .bind(client_id)
    .bind(collector_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| row_to_client(&r)))
}

/// Count every client registered under a collector, active or not
pub async fn count_all(pool: &MySqlPool, collector_id: &str) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) as total FROM clients WHERE collector_id = ?")
        .bind(collector_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get::<i64, _>("total"))
}

/// Count a collector's active clients
pub async fn count_active(pool: &MySqlPool, collector_id: &str) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) as total FROM clients WHERE collector_id = ? AND is_active = TRUE",
    )
    .bind(collector_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("total"))
}

/// Get a collector's active clients holding a rotation slot, in turn order
pub async fn positioned_active(
    pool: &MySqlPool,
    collector_id: &str,
) -> Result<Vec<PositionedClient>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, full_name, payout_position FROM clients \
         WHERE collector_id = ? AND is_active = TRUE AND payout_position IS NOT NULL \
         ORDER BY payout_position",
    )
    .bind(collector_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| PositionedClient {
            client_id: r.get("id"),
            full_name: r.get("full_name"),
            position: r.get("payout_position"),
        })
        .collect())
}

/// Of the supplied client IDs, return the ones that belong to the collector
pub async fn ids_in_collector(
    pool: &MySqlPool,
    collector_id: &str,
    client_ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    if client_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = client_ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    let query_str = format!(
        "SELECT id FROM clients WHERE collector_id = ? AND id IN ({})",
        placeholders
    );

    let mut query = sqlx::query(&query_str).bind(collector_id);
    for id in client_ids {
        query = query.bind(id);
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows.iter().map(|r| r.get("id")).collect())
}

/// Clear every rotation position for a collector's clients.
/// Runs on a transaction connection so the rewrite stays atomic.
pub async fn clear_positions(
    conn: &mut MySqlConnection,
    collector_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE clients SET payout_position = NULL WHERE collector_id = ?")
        .bind(collector_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Assign one client's rotation position within the same transaction
pub async fn set_position(
    conn: &mut MySqlConnection,
    client_id: &str,
    collector_id: &str,
    position: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE clients SET payout_position = ? WHERE id = ? AND collector_id = ?")
        .bind(position)
        .bind(client_id)
        .bind(collector_id)
        .execute(conn)
        .await?;

    Ok(())
}
