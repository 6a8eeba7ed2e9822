use chrono::Utc;
use serde::Serialize;
use sqlx::mysql::MySqlPool;

use crate::db;
use crate::services::schedule_service;
use crate::utils::ServiceResult;

/// The figures a collector opens the day with
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_clients: i64,
    pub active_clients: i64,
    pub pending_review: i64,
    pub confirmed_today: f64,
    pub total_balance: f64,
    pub current_recipient: Option<CurrentRecipient>,
}

/// Whoever holds the current rotation turn, if a schedule exists
#[derive(Debug, Clone, Serialize)]
pub struct CurrentRecipient {
    pub client_name: String,
    pub position: i32,
}

pub async fn get_dashboard(
    pool: &MySqlPool,
    collector_id: &str,
) -> ServiceResult<DashboardSummary> {
    let total_clients = db::client::count_all(pool, collector_id).await?;
    let active_clients = db::client::count_active(pool, collector_id).await?;
    let pending_review = db::transaction::count_pending(pool, collector_id).await?;
    let confirmed_today =
        db::transaction::sum_confirmed_on(pool, collector_id, Utc::now().date_naive()).await?;
    let total_balance = db::balance::total_for_collector(pool, collector_id).await?;

    let current_recipient = schedule_service::get_rotation_schedule(pool, collector_id)
        .await?
        .and_then(|schedule| {
            schedule
                .entries
                .into_iter()
                .find(|e| e.is_current)
                .map(|e| CurrentRecipient {
                    client_name: e.client_name,
                    position: e.position,
                })
        });

    Ok(DashboardSummary {
        total_clients,
        active_clients,
        pending_review,
        confirmed_today,
        total_balance,
        current_recipient,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_both_client_counts() {
        let summary = DashboardSummary {
            total_clients: 12,
            active_clients: 9,
            pending_review: 3,
            confirmed_today: 75.0,
            total_balance: 420.5,
            current_recipient: Some(CurrentRecipient {
                client_name: "Ama Serwaa".to_string(),
                position: 2,
            }),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_clients"], 12);
        assert_eq!(json["active_clients"], 9);
        assert_eq!(json["current_recipient"]["position"], 2);
    }
}
