use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;

use crate::models::{
    Transaction, TransactionFeedItem, TransactionStatus, ValidationFlag,
};

const TRANSACTION_COLUMNS: &str =
    "id, collector_id, client_id, CAST(amount AS DOUBLE) as amount, momo_ref, \
     submission_type, trust_level, status, validation_flags, raw_sms_text, \
     screenshot_key, collector_note, submitted_at, confirmed_at";

const FEED_COLUMNS: &str =
    "t.id, t.client_id, c.full_name as client_name, CAST(t.amount AS DOUBLE) as amount, \
     t.submission_type, t.trust_level, t.status, t.validation_flags, t.collector_note, \
     t.submitted_at, t.confirmed_at";

fn parse_flags(raw: Option<String>) -> Option<Vec<ValidationFlag>> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

fn row_to_transaction(row: &MySqlRow) -> Result<Transaction, sqlx::Error> {
    Ok(Transaction {
        id: row.get("id"),
        collector_id: row.get("collector_id"),
        client_id: row.get("client_id"),
        amount: row.get("amount"),
        momo_ref: row.get("momo_ref"),
        submission_type: row
            .get::<String, _>("submission_type")
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        trust_level: row
            .get::<String, _>("trust_level")
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        status: row
            .get::<String, _>("status")
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        validation_flags: parse_flags(row.get("validation_flags")),
        raw_sms_text: row.get("raw_sms_text"),
        screenshot_key: row.get("screenshot_key"),
        collector_note: row.get("collector_note"),
        submitted_at: row.get("submitted_at"),
        confirmed_at: row.get("confirmed_at"),
    })
}

fn row_to_feed_item(row: &MySqlRow) -> Result<TransactionFeedItem, sqlx::Error> {
    Ok(TransactionFeedItem {
        id: row.get("id"),
        client_id: row.get("client_id"),
        client_name: row.get("client_name"),
        amount: row.get("amount"),
        submission_type: row
            .get::<String, _>("submission_type")
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        trust_level: row
            .get::<String, _>("trust_level")
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        status: row
            .get::<String, _>("status")
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        validation_flags: parse_flags(row.get("validation_flags")),
        collector_note: row.get("collector_note"),
        submitted_at: row.get("submitted_at"),
        confirmed_at: row.get("confirmed_at"),
    })
}

/// Insert a new ledger entry
pub async fn insert(pool: &MySqlPool, entry: &Transaction) -> Result<(), sqlx::Error> {
    let flags_json = entry
        .validation_flags
        .as_ref()
        .and_then(|f| serde_json::to_string(f).ok());

    sqlx::query(
        "INSERT INTO transactions \
             (id, collector_id, client_id, amount, momo_ref, submission_type, \
              trust_level, status, validation_flags, raw_sms_text, screenshot_key, \
              collector_note, submitted_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.id)
    .bind(&entry.collector_id)
    .bind(&entry.client_id)
    .bind(entry.amount)
    .bind(&entry.momo_ref)
    .bind(entry.submission_type.as_str())
    .bind(entry.trust_level.as_str())
    .bind(entry.status.as_str())
    .bind(flags_json)
    .bind(&entry.raw_sms_text)
    .bind(&entry.screenshot_key)
    .bind(&entry.collector_note)
    .bind(entry.submitted_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Check whether any entry already carries this provider transaction id.
/// The lookup is global on purpose: a reference is spent once system-wide.
pub async fn momo_ref_exists(pool: &MySqlPool, momo_ref: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT id FROM transactions WHERE momo_ref = ? LIMIT 1")
        .bind(momo_ref)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

/// Get an entry by ID, scoped to the owning collector
pub async fn get_for_collector(
    pool: &MySqlPool,
    transaction_id: &str,
    collector_id: &str,
) -> Result<Option<Transaction>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM transactions WHERE id = ? AND collector_id = ?",
        TRANSACTION_COLUMNS
    ))
    .bind(transaction_id)
    .bind(collector_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_transaction(&r)).transpose()
}

/// Confirm an entry if it is still PENDING or QUERIED.
/// Returns the number of rows changed; 0 means the guard did not match.
pub async fn mark_confirmed(
    pool: &MySqlPool,
    transaction_id: &str,
    collector_id: &str,
    confirmed_at: NaiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE transactions SET status = 'CONFIRMED', confirmed_at = ? \
         WHERE id = ? AND collector_id = ? AND status IN ('PENDING', 'QUERIED')",
    )
    .bind(confirmed_at)
    .bind(transaction_id)
    .bind(collector_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Query an entry if it is still PENDING, recording the collector's note
pub async fn mark_queried(
    pool: &MySqlPool,
    transaction_id: &str,
    collector_id: &str,
    note: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE transactions SET status = 'QUERIED', collector_note = ? \
         WHERE id = ? AND collector_id = ? AND status = 'PENDING'",
    )
    .bind(note)
    .bind(transaction_id)
    .bind(collector_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Reject an entry if it is currently QUERIED, recording the collector's note
pub async fn mark_rejected(
    pool: &MySqlPool,
    transaction_id: &str,
    collector_id: &str,
    note: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE transactions SET status = 'REJECTED', collector_note = ? \
         WHERE id = ? AND collector_id = ? AND status = 'QUERIED'",
    )
    .bind(note)
    .bind(transaction_id)
    .bind(collector_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

fn pending_feed_sql() -> String {
    format!(
        "SELECT {} FROM transactions t JOIN clients c ON c.id = t.client_id \
         WHERE t.collector_id = ? AND t.status = 'PENDING' \
         ORDER BY t.submitted_at ASC LIMIT ? OFFSET ?",
        FEED_COLUMNS
    )
}

/// Entries awaiting collector review (PENDING only), oldest first so the
/// longest-waiting claim comes up first
pub async fn pending_feed(
    pool: &MySqlPool,
    collector_id: &str,
    skip: i64,
    limit: i64,
) -> Result<(Vec<TransactionFeedItem>, i64), sqlx::Error> {
    let rows = sqlx::query(&pending_feed_sql())
        .bind(collector_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await?;

    let total = count_pending(pool, collector_id).await?;

    let items = rows
        .iter()
        .map(row_to_feed_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((items, total))
}

/// Count entries awaiting collector review, matching the pending feed
pub async fn count_pending(pool: &MySqlPool, collector_id: &str) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) as total FROM transactions \
         WHERE collector_id = ? AND status = 'PENDING'",
    )
    .bind(collector_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("total"))
}

/// A collector's entries, optionally filtered by status.
/// Without a filter, AUTO_REJECTED entries stay out of the listing.
pub async fn list_for_collector(
    pool: &MySqlPool,
    collector_id: &str,
    status: Option<TransactionStatus>,
    skip: i64,
    limit: i64,
) -> Result<(Vec<TransactionFeedItem>, i64), sqlx::Error> {
    let status_clause = match status {
        Some(_) => "AND t.status = ?",
        None => "AND t.status <> 'AUTO_REJECTED'",
    };

    let query_str = format!(
        "SELECT {} FROM transactions t JOIN clients c ON c.id = t.client_id \
         WHERE t.collector_id = ? {} \
         ORDER BY t.submitted_at DESC LIMIT ? OFFSET ?",
        FEED_COLUMNS, status_clause
    );

    let mut query = sqlx::query(&query_str).bind(collector_id);
    if let Some(st) = status {
        query = query.bind(st.as_str());
    }
    let rows = query.bind(limit).bind(skip).fetch_all(pool).await?;

    let count_str = format!(
        "SELECT COUNT(*) as total FROM transactions t WHERE t.collector_id = ? {}",
        status_clause
    );
    let mut count_query = sqlx::query(&count_str).bind(collector_id);
    if let Some(st) = status {
        count_query = count_query.bind(st.as_str());
    }
    let total = count_query.fetch_one(pool).await?.get::<i64, _>("total");

    let items = rows
        .iter()
        .map(row_to_feed_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((items, total))
}

/// One client's deposit history, newest first, AUTO_REJECTED excluded
pub async fn list_for_client(
    pool: &MySqlPool,
    client_id: &str,
    skip: i64,
    limit: i64,
) -> Result<(Vec<Transaction>, i64), sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM transactions \
         WHERE client_id = ? AND status <> 'AUTO_REJECTED' \
         ORDER BY submitted_at DESC LIMIT ? OFFSET ?",
        TRANSACTION_COLUMNS
    ))
    .bind(client_id)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    let total = sqlx::query(
        "SELECT COUNT(*) as total FROM transactions \
         WHERE client_id = ? AND status <> 'AUTO_REJECTED'",
    )
    .bind(client_id)
    .fetch_one(pool)
    .await?
    .get::<i64, _>("total");

    let items = rows
        .iter()
        .map(row_to_transaction)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((items, total))
}

/// Total confirmed on a given day for a collector
pub async fn sum_confirmed_on(
    pool: &MySqlPool,
    collector_id: &str,
    day: NaiveDate,
) -> Result<f64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT CAST(COALESCE(SUM(amount), 0) AS DOUBLE) as total FROM transactions \
         WHERE collector_id = ? AND status = 'CONFIRMED' AND DATE(confirmed_at) = ?",
    )
    .bind(collector_id)
    .bind(day)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<f64, _>("total"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlagSeverity;

    #[test]
    fn test_review_feed_takes_oldest_pending_first() {
        let sql = pending_feed_sql();
        assert!(sql.contains("t.status = 'PENDING'"));
        assert!(!sql.contains("QUERIED"));
        assert!(sql.contains("ORDER BY t.submitted_at ASC"));
    }

    #[test]
    fn test_parse_flags_reads_the_stored_json() {
        let raw = r#"[{"field":"recipient_phone","message":"Recipient number does not match your MoMo number","severity":"HIGH"}]"#;
        let flags = parse_flags(Some(raw.to_string())).unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].field, "recipient_phone");
        assert_eq!(flags[0].severity, FlagSeverity::High);
    }

    #[test]
    fn test_parse_flags_tolerates_null_and_garbage() {
        assert_eq!(parse_flags(None), None);
        assert_eq!(parse_flags(Some("not json".to_string())), None);
    }
}
