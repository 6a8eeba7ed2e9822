use chrono::Utc;
use sqlx::mysql::{MySqlConnection, MySqlPool};
use sqlx::Row;
use uuid::Uuid;

use crate::db;
use crate::models::page;
use crate::models::{Client, Page, Payout, PayoutListItem, PayoutStatus, PayoutType};
use crate::services::notifier::{Notification, Notifier};
use crate::utils::{ServiceError, ServiceResult};

const LOCK_TIMEOUT_SECONDS: i32 = 5;

/// Client asks to withdraw from their balance.
///
/// The request is serialized per client with a MySQL advisory lock so two
/// concurrent requests cannot both pass the balance check against the same
/// funds. The balance gate here is the only over-withdrawal guard in the
/// payout lifecycle; approval and completion trust it.
pub async fn request_payout(
    pool: &MySqlPool,
    notifier: &Notifier,
    client: &Client,
    amount: f64,
    payout_type: PayoutType,
    reason: Option<&str>,
) -> ServiceResult<Payout> {
    if amount <= 0.0 {
        return Err(ServiceError::InvalidInput(format!(
            "Amount must be greater than 0, got {:.2}",
            amount
        )));
    }

    let mut conn = pool.acquire().await?;
    let lock_key = format!("payout:{}", client.id);

    // GET_LOCK returns 1 when granted, 0 on timeout, NULL on error
    let granted = sqlx::query("SELECT GET_LOCK(?, ?) as granted")
        .bind(&lock_key)
        .bind(LOCK_TIMEOUT_SECONDS)
        .fetch_one(&mut *conn)
        .await?
        .get::<Option<i64>, _>("granted");

    if granted != Some(1) {
        return Err(ServiceError::InvalidInput(
            "Another payout request for this client is in progress. Try again shortly."
                .to_string(),
        ));
    }

    let outcome = check_and_insert(&mut conn, client, amount, payout_type, reason).await;

    // The lock is session scoped; release it on every path so the pooled
    // connection goes back clean
    let released = sqlx::query("SELECT RELEASE_LOCK(?)")
        .bind(&lock_key)
        .execute(&mut *conn)
        .await;
    if let Err(e) = released {
        tracing::warn!("Failed to release payout lock {}: {}", lock_key, e);
    }

    let payout = outcome?;
    notifier.dispatch(Notification::payout_requested(
        &client.collector_id,
        &client.full_name,
        payout.amount,
    ));

    Ok(payout)
}

/// Balance gate and insert, run on the connection holding the advisory lock
async fn check_and_insert(
    conn: &mut MySqlConnection,
    client: &Client,
    amount: f64,
    payout_type: PayoutType,
    reason: Option<&str>,
) -> ServiceResult<Payout> {
    let balance = db::balance::for_client(&mut *conn, &client.id)
        .await?
        .map(|b| b.balance)
        .unwrap_or(0.0);

    check_payout_bounds(balance, amount)?;

    let payout = Payout {
        id: Uuid::new_v4().to_string(),
        collector_id: client.collector_id.clone(),
        client_id: client.id.clone(),
        amount,
        payout_type,
        status: PayoutStatus::Requested,
        reason: reason.map(|r| r.to_string()),
        requested_at: Utc::now().naive_utc(),
        approved_at: None,
        completed_at: None,
    };

    db::payout::insert(&mut *conn, &payout).await?;
    Ok(payout)
}

/// A decline always carries a reason for the client; require one and
/// keep it inside the column size
fn check_reason(reason: &str) -> Result<(), ServiceError> {
    let length = reason.chars().count();
    if length == 0 || length > 500 {
        return Err(ServiceError::InvalidInput(format!(
            "Reason must be 1 to 500 characters, got {}",
            length
        )));
    }
    Ok(())
}

/// Balance gate: a payout may take at most the confirmed balance
fn check_payout_bounds(balance: f64, amount: f64) -> Result<(), ServiceError> {
    if balance <= 0.0 {
        return Err(ServiceError::InvalidInput(
            "No available balance for payout".to_string(),
        ));
    }
    if amount > balance {
        return Err(ServiceError::InvalidInput(format!(
            "Payout amount GHS {:.2} exceeds available balance GHS {:.2}",
            amount, balance
        )));
    }
    Ok(())
}

/// Approve a requested payout
pub async fn approve_payout(
    pool: &MySqlPool,
    notifier: &Notifier,
    collector_id: &str,
    payout_id: &str,
) -> ServiceResult<Payout> {
    let changed =
        db::payout::mark_approved(pool, payout_id, collector_id, Utc::now().naive_utc()).await?;

    if changed == 0 {
        return Err(transition_failure(pool, payout_id, collector_id, "approve").await?);
    }

    let payout = db::payout::get_for_collector(pool, payout_id, collector_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Payout"))?;

    notifier.dispatch(Notification::payout_approved(
        &payout.client_id,
        payout.amount,
    ));

    Ok(payout)
}

/// Decline a requested payout. The collector's reason replaces whatever
/// the client wrote at request time.
pub async fn decline_payout(
    pool: &MySqlPool,
    notifier: &Notifier,
    collector_id: &str,
    payout_id: &str,
    reason: &str,
) -> ServiceResult<Payout> {
    check_reason(reason)?;

    let changed = db::payout::mark_declined(pool, payout_id, collector_id, reason).await?;

    if changed == 0 {
        return Err(transition_failure(pool, payout_id, collector_id, "decline").await?);
    }

    let payout = db::payout::get_for_collector(pool, payout_id, collector_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Payout"))?;

    notifier.dispatch(Notification::payout_declined(
        &payout.client_id,
        payout.amount,
        reason,
    ));

    Ok(payout)
}

/// Record the cash handover for an approved payout. From here on the
/// amount counts against the client's balance.
pub async fn complete_payout(
    pool: &MySqlPool,
    collector_id: &str,
    payout_id: &str,
) -> ServiceResult<Payout> {
    let changed =
        db::payout::mark_completed(pool, payout_id, collector_id, Utc::now().naive_utc()).await?;

    if changed == 0 {
        return Err(transition_failure(pool, payout_id, collector_id, "complete").await?);
    }

    db::payout::get_for_collector(pool, payout_id, collector_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Payout"))
}

async fn transition_failure(
    pool: &MySqlPool,
    payout_id: &str,
    collector_id: &str,
    action: &'static str,
) -> Result<ServiceError, sqlx::Error> {
    match db::payout::get_for_collector(pool, payout_id, collector_id).await? {
        Some(payout) => Ok(ServiceError::StateConflict {
            action,
            entity: "payout",
            status: payout.status.to_string(),
        }),
        None => Ok(ServiceError::not_found("Payout")),
    }
}

/// A collector's payouts, optionally filtered by status, newest first
pub async fn list_collector_payouts(
    pool: &MySqlPool,
    collector_id: &str,
    status: Option<PayoutStatus>,
    skip: i64,
    limit: i64,
) -> ServiceResult<Page<PayoutListItem>> {
    let (skip, limit) = page::clamp(skip, limit);
    let (items, total) = db::payout::list_for_collector(
        pool,
        collector_id,
        status.map(|s| s.as_str()),
        skip,
        limit,
    )
    .await?;
    Ok(Page::new(items, total, skip, limit))
}

/// A client's own payout history, newest first
pub async fn list_client_payouts(
    pool: &MySqlPool,
    client: &Client,
    skip: i64,
    limit: i64,
) -> ServiceResult<Page<Payout>> {
    let (skip, limit) = page::clamp(skip, limit);
    let (items, total) = db::payout::list_for_client(pool, &client.id, skip, limit).await?;
    Ok(Page::new(items, total, skip, limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_balance_refuses_any_payout() {
        let err = check_payout_bounds(0.0, 10.0).unwrap_err();
        assert_eq!(err.to_string(), "No available balance for payout");
        assert!(check_payout_bounds(-5.0, 1.0).is_err());
    }

    #[test]
    fn test_amount_above_balance_names_both_values() {
        let err = check_payout_bounds(40.0, 55.5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Payout amount GHS 55.50 exceeds available balance GHS 40.00"
        );
    }

    #[test]
    fn test_amount_up_to_balance_passes() {
        assert!(check_payout_bounds(40.0, 40.0).is_ok());
        assert!(check_payout_bounds(40.0, 12.25).is_ok());
    }

    #[test]
    fn test_decline_reason_must_not_be_empty_or_oversized() {
        let err = check_reason("").unwrap_err();
        assert_eq!(err.to_string(), "Reason must be 1 to 500 characters, got 0");

        assert!(check_reason("Balance is needed for the group payout on Friday").is_ok());
        assert!(check_reason(&"x".repeat(501)).is_err());
    }
}
