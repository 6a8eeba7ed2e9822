//! Client models

use chrono::NaiveDateTime;
use serde::Serialize;

/// A saver within one collector's group
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub id: String,
    pub collector_id: String,
    pub full_name: String,
    pub phone: String,
    /// 1-based slot in the payout rotation, or None when not part of it.
    pub payout_position: Option<i32>,
    pub is_active: bool,
    pub joined_at: NaiveDateTime,
}
