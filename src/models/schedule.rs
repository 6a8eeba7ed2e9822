//! Rotation schedule models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An active client holding a slot in the rotation, as loaded for scheduling
#[derive(Debug, Clone)]
pub struct PositionedClient {
    pub client_id: String,
    pub full_name: String,
    pub position: i32,
}

/// One client's turn within the current cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub position: i32,
    pub client_id: String,
    pub client_name: String,
    pub payout_date: NaiveDate,
    /// True while today falls inside [payout_date, payout_date + interval).
    pub is_current: bool,
    /// True once the turn window has passed within this cycle.
    pub is_completed: bool,
}

/// The computed calendar for a collector's current rotation cycle
#[derive(Debug, Clone, Serialize)]
pub struct RotationSchedule {
    pub cycle_start_date: NaiveDate,
    pub payout_interval_days: i32,
    /// positioned clients x interval days.
    pub cycle_length_days: i64,
    /// 0-based count of fully elapsed cycles; 0 before the start date too.
    pub current_cycle: i64,
    pub current_cycle_start: NaiveDate,
    pub entries: Vec<ScheduleEntry>,
}

/// The schedule projected onto a single client
#[derive(Debug, Clone, Serialize)]
pub struct ClientScheduleSummary {
    pub has_schedule: bool,
    pub my_position: Option<i32>,
    pub my_payout_date: Option<NaiveDate>,
    /// None once the client's date has passed this cycle.
    pub days_until_payout: Option<i64>,
    pub current_recipient: Option<String>,
    /// First turn still ahead of today; None after the last turn of the cycle.
    pub next_recipient: Option<String>,
    pub total_positions: i32,
    pub payout_interval_days: i32,
}

impl ClientScheduleSummary {
    /// Summary for a group with no configured rotation, or a client
    /// holding no slot in it.
    pub fn none() -> Self {
        ClientScheduleSummary {
            has_schedule: false,
            my_position: None,
            my_payout_date: None,
            days_until_payout: None,
            current_recipient: None,
            next_recipient: None,
            total_positions: 0,
            payout_interval_days: 7,
        }
    }
}

/// One (client, position) pair supplied to a bulk rotation rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionAssignment {
    pub client_id: String,
    pub position: i32,
}
