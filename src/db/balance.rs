use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;

use crate::models::ClientBalance;

const BALANCE_COLUMNS: &str =
    "client_id, collector_id, full_name, phone, \
     CAST(total_deposits AS DOUBLE) as total_deposits, \
     CAST(total_payouts AS DOUBLE) as total_payouts, \
     CAST(balance AS DOUBLE) as balance";

fn row_to_balance(row: &MySqlRow) -> ClientBalance {
    ClientBalance {
        client_id: row.get("client_id"),
        collector_id: row.get("collector_id"),
        full_name: row.get("full_name"),
        phone: row.get("phone"),
        total_deposits: row.get("total_deposits"),
        total_payouts: row.get("total_payouts"),
        balance: row.get("balance"),
    }
}

/// Live balance for one active client, straight from the client_balances view.
/// Generic over the executor so the payout request path can read it on the
/// connection holding the per-client advisory lock.
pub async fn for_client<'e, E>(
    executor: E,
    client_id: &str,
) -> Result<Option<ClientBalance>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    let row = sqlx::query(&format!(
        "SELECT {} FROM client_balances WHERE client_id = ?",
        BALANCE_COLUMNS
    ))
    .bind(client_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| row_to_balance(&r)))
}

/// Balances for all of a collector's active clients, ordered by name
pub async fn for_collector(
    pool: &MySqlPool,
    collector_id: &str,
) -> Result<Vec<ClientBalance>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM client_balances WHERE collector_id = ? ORDER BY full_name",
        BALANCE_COLUMNS
    ))
    .bind(collector_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_balance).collect())
}

/// Sum of balances held across a collector's active clients
pub async fn total_for_collector(
    pool: &MySqlPool,
    collector_id: &str,
) -> Result<f64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT CAST(COALESCE(SUM(balance), 0) AS DOUBLE) as total \
         FROM client_balances WHERE collector_id = ?",
    )
    .bind(collector_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<f64, _>("total"))
}
