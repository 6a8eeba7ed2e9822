//! Balance models

use serde::Serialize;

use super::client::Client;

/// Live balance aggregate for one client, read from the client_balances view
///
/// balance = total confirmed deposits minus total completed payouts. Always
/// computed fresh by the database on read, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct ClientBalance {
    pub client_id: String,
    pub collector_id: String,
    pub full_name: String,
    pub phone: String,
    pub total_deposits: f64,
    pub total_payouts: f64,
    pub balance: f64,
}

impl ClientBalance {
    /// Zero totals for a client the view does not cover, either because
    /// nothing was confirmed yet or because the client is inactive.
    pub fn zeroed(client: &Client) -> Self {
        ClientBalance {
            client_id: client.id.clone(),
            collector_id: client.collector_id.clone(),
            full_name: client.full_name.clone(),
            phone: client.phone.clone(),
            total_deposits: 0.0,
            total_payouts: 0.0,
            balance: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_zeroed_balance_keeps_the_client_identity() {
        let client = Client {
            id: "a".to_string(),
            collector_id: "col".to_string(),
            full_name: "Ama Serwaa".to_string(),
            phone: "0241111111".to_string(),
            payout_position: None,
            is_active: false,
            joined_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };

        let balance = ClientBalance::zeroed(&client);
        assert_eq!(balance.client_id, "a");
        assert_eq!(balance.full_name, "Ama Serwaa");
        assert_eq!(balance.total_deposits, 0.0);
        assert_eq!(balance.total_payouts, 0.0);
        assert_eq!(balance.balance, 0.0);
    }
}
