use chrono::NaiveDate;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;

use crate::models::Collector;

const COLLECTOR_COLUMNS: &str = "id, full_name, phone, momo_number, is_active, \
     cycle_start_date, payout_interval_days, \
     CAST(contribution_amount AS DOUBLE) as contribution_amount, \
     contribution_frequency, created_at";

fn row_to_collector(row: &MySqlRow) -> Collector {
    Collector {
        id: row.get("id"),
        full_name: row.get("full_name"),
        phone: row.get("phone"),
        momo_number: row.get("momo_number"),
        is_active: row.get("is_active"),
        cycle_start_date: row.get("cycle_start_date"),
        payout_interval_days: row.get("payout_interval_days"),
        contribution_amount: row.get("contribution_amount"),
        contribution_frequency: row.get("contribution_frequency"),
        created_at: row.get("created_at"),
    }
}

/// Get a collector by ID
pub async fn get_by_id(
    pool: &MySqlPool,
    collector_id: &str,
) -> Result<Option<Collector>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM collectors WHERE id = ?",
        COLLECTOR_COLUMNS
    ))
    .bind(collector_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| row_to_collector(&r)))
}

/// Partially update a collector's rotation settings; None leaves a field unchanged
pub async fn update_rotation_settings(
    pool: &MySqlPool,
    collector_id: &str,
    cycle_start_date: Option<NaiveDate>,
    payout_interval_days: Option<i32>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE collectors SET \
             cycle_start_date = COALESCE(?, cycle_start_date), \
             payout_interval_days = COALESCE(?, payout_interval_days) \
         WHERE id = ?",
    )
    .bind(cycle_start_date)
    .bind(payout_interval_days)
    .bind(collector_id)
    .execute(pool)
    .await?;

    Ok(())
}
