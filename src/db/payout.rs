use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;

use crate::models::{Payout, PayoutListItem};

const PAYOUT_COLUMNS: &str =
    "id, collector_id, client_id, CAST(amount AS DOUBLE) as amount, payout_type, \
     status, reason, requested_at, approved_at, completed_at";

fn row_to_payout(row: &MySqlRow) -> Result<Payout, sqlx::Error> {
    Ok(Payout {
        id: row.get("id"),
        collector_id: row.get("collector_id"),
        client_id: row.get("client_id"),
        amount: row.get("amount"),
        payout_type: row
            .get::<String, _>("payout_type")
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        status: row
            .get::<String, _>("status")
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        reason: row.get("reason"),
        requested_at: row.get("requested_at"),
        approved_at: row.get("approved_at"),
        completed_at: row.get("completed_at"),
    })
}

/// Insert a new payout request.
/// Generic over the executor so the request path can run it on the same
/// connection that holds the per-client advisory lock.
pub async fn insert<'e, E>(executor: E, payout: &Payout) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    sqlx::query(
        "INSERT INTO payouts \
             (id, collector_id, client_id, amount, payout_type, status, reason, requested_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payout.id)
    .bind(&payout.collector_id)
    .bind(&payout.client_id)
    .bind(payout.amount)
    .bind(payout.payout_type.as_str())
    .bind(payout.status.as_str())
    .bind(&payout.reason)
    .bind(payout.requested_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Get a payout by ID, scoped to the owning collector
pub async fn get_for_collector(
    pool: &MySqlPool,
    payout_id: &str,
    collector_id: &str,
) -> Result<Option<Payout>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM payouts WHERE id = ? AND collector_id = ?",
        PAYOUT_COLUMNS
    ))
    .bind(payout_id)
    .bind(collector_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_payout(&r)).transpose()
}

/// Approve a payout if it is still REQUESTED.
/// Returns the number of rows changed; 0 means the guard did not match.
pub async fn mark_approved(
    pool: &MySqlPool,
    payout_id: &str,
    collector_id: &str,
    approved_at: NaiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payouts SET status = 'APPROVED', approved_at = ? \
         WHERE id = ? AND collector_id = ? AND status = 'REQUESTED'",
    )
    .bind(approved_at)
    .bind(payout_id)
    .bind(collector_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Decline a payout if it is still REQUESTED, overwriting the stored reason
pub async fn mark_declined(
    pool: &MySqlPool,
    payout_id: &str,
    collector_id: &str,
    reason: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payouts SET status = 'DECLINED', reason = ? \
         WHERE id = ? AND collector_id = ? AND status = 'REQUESTED'",
    )
    .bind(reason)
    .bind(payout_id)
    .bind(collector_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Complete a payout if it is APPROVED
pub async fn mark_completed(
    pool: &MySqlPool,
    payout_id: &str,
    collector_id: &str,
    completed_at: NaiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payouts SET status = 'COMPLETED', completed_at = ? \
         WHERE id = ? AND collector_id = ? AND status = 'APPROVED'",
    )
    .bind(completed_at)
    .bind(payout_id)
    .bind(collector_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// A collector's payouts, optionally filtered by status, newest first
pub async fn list_for_collector(
    pool: &MySqlPool,
    collector_id: &str,
    status: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<(Vec<PayoutListItem>, i64), sqlx::Error> {
    let status_clause = match status {
        Some(_) => "AND p.status = ?",
        None => "",
    };

    let query_str = format!(
        "SELECT p.id, p.client_id, c.full_name as client_name, \
                CAST(p.amount AS DOUBLE) as amount, p.payout_type, p.status, \
                p.reason, p.requested_at \
         FROM payouts p JOIN clients c ON c.id = p.client_id \
         WHERE p.collector_id = ? {} \
         ORDER BY p.requested_at DESC LIMIT ? OFFSET ?",
        status_clause
    );

    let mut query = sqlx::query(&query_str).bind(collector_id);
    if let Some(st) = status {
        query = query.bind(st);
    }
    let rows = query.bind(limit).bind(skip).fetch_all(pool).await?;

    let count_str = format!(
        "SELECT COUNT(*) as total FROM payouts p WHERE p.collector_id = ? {}",
        status_clause
    );
    let mut count_query = sqlx::query(&count_str).bind(collector_id);
    if let Some(st) = status {
        count_query = count_query.bind(st);
    }
    let total = count_query.fetch_one(pool).await?.get::<i64, _>("total");

    let items = rows
        .iter()
        .map(|r| -> Result<PayoutListItem, sqlx::Error> {
            Ok(PayoutListItem {
                id: r.get("id"),
                client_id: r.get("client_id"),
                client_name: r.get("client_name"),
                amount: r.get("amount"),
                payout_type: r
                    .get::<String, _>("payout_type")
                    .parse()
                    .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
                status: r
                    .get::<String, _>("status")
                    .parse()
                    .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
                reason: r.get("reason"),
                requested_at: r.get("requested_at"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((items, total))
}

/// One client's payout history, newest first
pub async fn list_for_client(
    pool: &MySqlPool,
    client_id: &str,
    skip: i64,
    limit: i64,
) -> Result<(Vec<Payout>, i64), sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM payouts WHERE client_id = ? \
         ORDER BY requested_at DESC LIMIT ? OFFSET ?",
        PAYOUT_COLUMNS
    ))
    .bind(client_id)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    let total = sqlx::query("SELECT COUNT(*) as total FROM payouts WHERE client_id = ?")
        .bind(client_id)
        .fetch_one(pool)
        .await?
        .get::<i64, _>("total");

    let items = rows
        .iter()
        .map(row_to_payout)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((items, total))
}
