use sqlx::mysql::MySqlPool;

use crate::db;
use crate::models::ClientBalance;
use crate::utils::{ServiceError, ServiceResult};

/// A client's own live balance, derived entirely from confirmed deposits
/// minus completed payouts. A client the view does not cover reads as
/// zeros, not as missing.
pub async fn get_client_balance(
    pool: &MySqlPool,
    client_id: &str,
) -> ServiceResult<ClientBalance> {
    let client = db::client::get_by_id(pool, client_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Client"))?;

    Ok(db::balance::for_client(pool, client_id)
        .await?
        .unwrap_or_else(|| ClientBalance::zeroed(&client)))
}

/// Same view scoped through a collector; a client outside the collector's
/// group reads as missing
pub async fn get_client_balance_for_collector(
    pool: &MySqlPool,
    collector_id: &str,
    client_id: &str,
) -> ServiceResult<ClientBalance> {
    let client = db::client::get_for_collector(pool, client_id, collector_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Client not found in your group".to_string()))?;

    Ok(db::balance::for_client(pool, client_id)
        .await?
        .unwrap_or_else(|| ClientBalance::zeroed(&client)))
}

/// Live balances for every active client in a collector's group,
/// ordered by name
pub async fn get_collector_balances(
    pool: &MySqlPool,
    collector_id: &str,
) -> ServiceResult<Vec<ClientBalance>> {
    Ok(db::balance::for_collector(pool, collector_id).await?)
}
