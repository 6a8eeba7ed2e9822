//! Collector models

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// The operator of one susu group
#[derive(Debug, Clone, Serialize)]
pub struct Collector {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    /// Registered mobile-money receiving number, matched against the
    /// recipient phone parsed out of submitted SMS evidence.
    pub momo_number: Option<String>,
    pub is_active: bool,
    /// First day of the first rotation cycle; no schedule exists until set.
    pub cycle_start_date: Option<NaiveDate>,
    pub payout_interval_days: i32,
    pub contribution_amount: Option<f64>,
    pub contribution_frequency: String,
    pub created_at: NaiveDateTime,
}
