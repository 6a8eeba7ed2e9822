use chrono::Utc;
use sqlx::mysql::MySqlPool;
use tracing::warn;
use uuid::Uuid;

use crate::db;
use crate::models::page;
use crate::models::{
    Client, Collector, Page, SubmissionType, Transaction, TransactionFeedItem, TransactionStatus,
    TrustLevel,
};
use crate::services::notifier::{Notification, Notifier};
use crate::services::sms_parser::{self, ParsedSms};
use crate::services::validator::{self, ValidationOutcome};
use crate::utils::{self, ServiceError, ServiceResult};

/// Everything a submission call hands back: the stored entry plus the
/// parsed evidence and validation outcome that shaped it (SMS path only)
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub transaction: Transaction,
    pub parsed: Option<ParsedSms>,
    pub validation: Option<ValidationOutcome>,
}

/// Collector submits SMS evidence on behalf of one of their clients
pub async fn submit_sms(
    pool: &MySqlPool,
    notifier: &Notifier,
    collector: &Collector,
    client_id: &str,
    sms_text: &str,
) -> ServiceResult<SubmissionReceipt> {
    utils::check_submission_allowed(client_id)
        .await
        .map_err(|_| ServiceError::RateLimited)?;

    let client = db::client::get_for_collector(pool, client_id, &collector.id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Client not found in your group".to_string()))?;

    create_sms_entry(pool, notifier, collector, &client, sms_text).await
}

/// Client submits SMS evidence for their own deposit
pub async fn submit_sms_as_client(
    pool: &MySqlPool,
    notifier: &Notifier,
    client: &Client,
    sms_text: &str,
) -> ServiceResult<SubmissionReceipt> {
    utils::check_submission_allowed(&client.id)
        .await
        .map_err(|_| ServiceError::RateLimited)?;

    let collector = db::collector::get_by_id(pool, &client.collector_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Collector"))?;

    create_sms_entry(pool, notifier, &collector, client, sms_text).await
}

/// Collector submits screenshot evidence on behalf of one of their clients
pub async fn submit_screenshot(
    pool: &MySqlPool,
    notifier: &Notifier,
    collector: &Collector,
    client_id: &str,
    amount: f64,
    screenshot_key: &str,
) -> ServiceResult<SubmissionReceipt> {
    utils::check_submission_allowed(client_id)
        .await
        .map_err(|_| ServiceError::RateLimited)?;

    let client = db::client::get_for_collector(pool, client_id, &collector.id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Client not found in your group".to_string()))?;

    create_screenshot_entry(pool, notifier, collector, &client, amount, screenshot_key).await
}

/// Client submits screenshot evidence for their own deposit
pub async fn submit_screenshot_as_client(
    pool: &MySqlPool,
    notifier: &Notifier,
    client: &Client,
    amount: f64,
    screenshot_key: &str,
) -> ServiceResult<SubmissionReceipt> {
    utils::check_submission_allowed(&client.id)
        .await
        .map_err(|_| ServiceError::RateLimited)?;

    let collector = db::collector::get_by_id(pool, &client.collector_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Collector"))?;

    create_screenshot_entry(pool, notifier, &collector, client, amount, screenshot_key).await
}

async fn create_sms_entry(
    pool: &MySqlPool,
    notifier: &Notifier,
    collector: &Collector,
    client: &Client,
    sms_text: &str,
) -> ServiceResult<SubmissionReceipt> {
    let parsed = sms_parser::parse_momo_sms(sms_text);
    let mut validation = validator::validate_submission(pool, &parsed, collector).await?;

    // The SMS path never trusts a submitter-declared amount; an unparsed
    // amount is stored as 0 for the collector to sort out
    let mut entry = Transaction {
        id: Uuid::new_v4().to_string(),
        collector_id: collector.id.clone(),
        client_id: client.id.clone(),
        amount: parsed.amount.unwrap_or(0.0),
        momo_ref: if validation.auto_reject {
            None
        } else {
            parsed.momo_ref.clone()
        },
        submission_type: SubmissionType::SmsText,
        trust_level: validation.trust_level,
        status: if validation.auto_reject {
            TransactionStatus::AutoRejected
        } else {
            TransactionStatus::Pending
        },
        validation_flags: if validation.flags.is_empty() {
            None
        } else {
            Some(validation.flags.clone())
        },
        raw_sms_text: Some(sms_text.to_string()),
        screenshot_key: None,
        collector_note: None,
        submitted_at: Utc::now().naive_utc(),
        confirmed_at: None,
    };

    // The duplicate check and this insert are not atomic; a racing submission
    // with the same momo ref trips the unique key instead. Translate that
    // into the same auto-rejected outcome, with the ref left unstored.
    if let Err(e) = db::transaction::insert(pool, &entry).await {
        if entry.momo_ref.is_some() && utils::is_unique_violation(&e) {
            warn!(
                "Duplicate momo ref raced past the check, auto-rejecting entry {}",
                entry.id
            );
            validation = ValidationOutcome::duplicate();
            entry.momo_ref = None;
            entry.trust_level = TrustLevel::AutoRejected;
            entry.status = TransactionStatus::AutoRejected;
            entry.validation_flags = None;
            db::transaction::insert(pool, &entry).await?;
        } else {
            return Err(e.into());
        }
    }

    utils::record_submission(&client.id).await;

    if validation.auto_reject {
        notifier.dispatch(Notification::duplicate_submission(&client.id));
    } else {
        notifier.dispatch(Notification::payment_submitted(
            &collector.id,
            &client.full_name,
            entry.amount,
        ));
    }

    Ok(SubmissionReceipt {
        transaction: entry,
        parsed: Some(parsed),
        validation: Some(validation),
    })
}

async fn create_screenshot_entry(
    pool: &MySqlPool,
    notifier: &Notifier,
    collector: &Collector,
    client: &Client,
    amount: f64,
    screenshot_key: &str,
) -> ServiceResult<SubmissionReceipt> {
    if amount <= 0.0 {
        return Err(ServiceError::InvalidInput(format!(
            "Amount must be greater than 0, got {:.2}",
            amount
        )));
    }

    // No structured evidence exists to validate, so the entry starts at LOW
    // trust with the submitter-declared amount
    let entry = Transaction {
        id: Uuid::new_v4().to_string(),
        collector_id: collector.id.clone(),
        client_id: client.id.clone(),
        amount,
        momo_ref: None,
        submission_type: SubmissionType::Screenshot,
        trust_level: TrustLevel::Low,
        status: TransactionStatus::Pending,
        validation_flags: None,
        raw_sms_text: None,
        screenshot_key: Some(screenshot_key.to_string()),
        collector_note: None,
        submitted_at: Utc::now().naive_utc(),
        confirmed_at: None,
    };

    db::transaction::insert(pool, &entry).await?;
    utils::record_submission(&client.id).await;

    notifier.dispatch(Notification::payment_submitted(
        &collector.id,
        &client.full_name,
        entry.amount,
    ));

    Ok(SubmissionReceipt {
        transaction: entry,
        parsed: None,
        validation: None,
    })
}

/// Confirm a pending or queried entry; the only way money enters the ledger
pub async fn confirm_transaction(
    pool: &MySqlPool,
    notifier: &Notifier,
    collector_id: &str,
    transaction_id: &str,
) -> ServiceResult<Transaction> {
    let changed = db::transaction::mark_confirmed(
        pool,
        transaction_id,
        collector_id,
        Utc::now().naive_utc(),
    )
    .await?;

    if changed == 0 {
        return Err(transition_failure(pool, transaction_id, collector_id, "confirm").await?);
    }

    let entry = db::transaction::get_for_collector(pool, transaction_id, collector_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Transaction"))?;

    let balance = db::balance::for_client(pool, &entry.client_id)
        .await?
        .map(|b| b.balance)
        .unwrap_or(0.0);
    notifier.dispatch(Notification::payment_confirmed(
        &entry.client_id,
        entry.amount,
        balance,
    ));

    Ok(entry)
}

/// Query a pending entry back to the client with a note
pub async fn query_transaction(
    pool: &MySqlPool,
    notifier: &Notifier,
    collector_id: &str,
    transaction_id: &str,
    note: &str,
) -> ServiceResult<Transaction> {
    check_note(note)?;

    let changed = db::transaction::mark_queried(pool, transaction_id, collector_id, note).await?;

    if changed == 0 {
        return Err(transition_failure(pool, transaction_id, collector_id, "query").await?);
    }

    let entry = db::transaction::get_for_collector(pool, transaction_id, collector_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Transaction"))?;

    notifier.dispatch(Notification::payment_queried(
        &entry.client_id,
        entry.amount,
        note,
    ));

    Ok(entry)
}

/// Reject a queried entry with a note
pub async fn reject_transaction(
    pool: &MySqlPool,
    notifier: &Notifier,
    collector_id: &str,
    transaction_id: &str,
    note: &str,
) -> ServiceResult<Transaction> {
    check_note(note)?;

    let changed = db::transaction::mark_rejected(pool, transaction_id, collector_id, note).await?;

    if changed == 0 {
        return Err(transition_failure(pool, transaction_id, collector_id, "reject").await?);
    }

    let entry = db::transaction::get_for_collector(pool, transaction_id, collector_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Transaction"))?;

    notifier.dispatch(Notification::payment_rejected(
        &entry.client_id,
        entry.amount,
        note,
    ));

    Ok(entry)
}

/// Query and reject both carry a collector note; require one and keep it
/// inside the column size
fn check_note(note: &str) -> Result<(), ServiceError> {
    let length = note.chars().count();
    if length == 0 || length > 500 {
        return Err(ServiceError::InvalidInput(format!(
            "Note must be 1 to 500 characters, got {}",
            length
        )));
    }
    Ok(())
}

/// Work out why a guarded transition update changed no rows: either the
/// entry does not exist for this collector, or its status blocks the action
async fn transition_failure(
    pool: &MySqlPool,
    transaction_id: &str,
    collector_id: &str,
    action: &'static str,
) -> Result<ServiceError, sqlx::Error> {
    match db::transaction::get_for_collector(pool, transaction_id, collector_id).await? {
        Some(entry) => Ok(ServiceError::StateConflict {
            action,
            entity: "transaction",
            status: entry.status.to_string(),
        }),
        None => Ok(ServiceError::not_found("Transaction")),
    }
}

/// Entries awaiting collector review, oldest first
pub async fn get_pending_feed(
    pool: &MySqlPool,
    collector_id: &str,
    skip: i64,
    limit: i64,
) -> ServiceResult<Page<TransactionFeedItem>> {
    let (skip, limit) = page::clamp(skip, limit);
    let (items, total) = db::transaction::pending_feed(pool, collector_id, skip, limit).await?;
    Ok(Page::new(items, total, skip, limit))
}

/// A collector's entries, optionally filtered by status.
/// AUTO_REJECTED only appears when named explicitly in the filter.
pub async fn get_collector_transactions(
    pool: &MySqlPool,
    collector_id: &str,
    status: Option<TransactionStatus>,
    skip: i64,
    limit: i64,
) -> ServiceResult<Page<TransactionFeedItem>> {
    let (skip, limit) = page::clamp(skip, limit);
    let (items, total) =
        db::transaction::list_for_collector(pool, collector_id, status, skip, limit).await?;
    Ok(Page::new(items, total, skip, limit))
}

/// A client's own deposit history
pub async fn get_client_transactions(
    pool: &MySqlPool,
    client: &Client,
    skip: i64,
    limit: i64,
) -> ServiceResult<Page<Transaction>> {
    let (skip, limit) = page::clamp(skip, limit);
    let (items, total) = db::transaction::list_for_client(pool, &client.id, skip, limit).await?;
    Ok(Page::new(items, total, skip, limit))
}

/// One client's deposit history as seen by their collector
pub async fn get_client_history(
    pool: &MySqlPool,
    collector_id: &str,
    client_id: &str,
    skip: i64,
    limit: i64,
) -> ServiceResult<Page<Transaction>> {
    let client = db::client::get_for_collector(pool, client_id, collector_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Client not found in your group".to_string()))?;

    let (skip, limit) = page::clamp(skip, limit);
    let (items, total) = db::transaction::list_for_client(pool, &client.id, skip, limit).await?;
    Ok(Page::new(items, total, skip, limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_must_be_one_to_five_hundred_characters() {
        let err = check_note("").unwrap_err();
        assert_eq!(err.to_string(), "Note must be 1 to 500 characters, got 0");

        assert!(check_note("Which sender is this? The name does not match.").is_ok());
        assert!(check_note(&"x".repeat(500)).is_ok());
        assert!(check_note(&"x".repeat(501)).is_err());
    }
}
