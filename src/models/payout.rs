//! Payout models

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Why a payout is being taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutType {
    Scheduled,
    Emergency,
}

impl PayoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutType::Scheduled => "SCHEDULED",
            PayoutType::Emergency => "EMERGENCY",
        }
    }
}

impl FromStr for PayoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(PayoutType::Scheduled),
            "EMERGENCY" => Ok(PayoutType::Emergency),
            other => Err(format!("unknown payout type '{}'", other)),
        }
    }
}

/// Lifecycle state of a payout request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Requested,
    Approved,
    Declined,
    Completed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Requested => "REQUESTED",
            PayoutStatus::Approved => "APPROVED",
            PayoutStatus::Declined => "DECLINED",
            PayoutStatus::Completed => "COMPLETED",
        }
    }

    /// Approve and decline are legal only from REQUESTED.
    pub fn can_approve(&self) -> bool {
        matches!(self, PayoutStatus::Requested)
    }

    pub fn can_decline(&self) -> bool {
        matches!(self, PayoutStatus::Requested)
    }

    /// Complete is legal only from APPROVED.
    pub fn can_complete(&self) -> bool {
        matches!(self, PayoutStatus::Approved)
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REQUESTED" => Ok(PayoutStatus::Requested),
            "APPROVED" => Ok(PayoutStatus::Approved),
            "DECLINED" => Ok(PayoutStatus::Declined),
            "COMPLETED" => Ok(PayoutStatus::Completed),
            other => Err(format!("unknown payout status '{}'", other)),
        }
    }
}

/// A persisted payout request
#[derive(Debug, Clone, Serialize)]
pub struct Payout {
    pub id: String,
    pub collector_id: String,
    pub client_id: String,
    pub amount: f64,
    pub payout_type: PayoutType,
    pub status: PayoutStatus,
    /// Set by the client at request time; overwritten by the collector's
    /// reason on decline.
    pub reason: Option<String>,
    pub requested_at: NaiveDateTime,
    pub approved_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

/// One row in a collector payout listing, joined with the client's name
#[derive(Debug, Clone, Serialize)]
pub struct PayoutListItem {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub amount: f64,
    pub payout_type: PayoutType,
    pub status: PayoutStatus,
    pub reason: Option<String>,
    pub requested_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_and_decline_only_from_requested() {
        assert!(PayoutStatus::Requested.can_approve());
        assert!(PayoutStatus::Requested.can_decline());
        assert!(!PayoutStatus::Approved.can_approve());
        assert!(!PayoutStatus::Declined.can_decline());
        assert!(!PayoutStatus::Completed.can_approve());
    }

    #[test]
    fn test_complete_only_from_approved() {
        assert!(PayoutStatus::Approved.can_complete());
        assert!(!PayoutStatus::Requested.can_complete());
        assert!(!PayoutStatus::Completed.can_complete());
    }

    #[test]
    fn test_status_strings_round_trip() {
        for status in [
            PayoutStatus::Requested,
            PayoutStatus::Approved,
            PayoutStatus::Declined,
            PayoutStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<PayoutStatus>(), Ok(status));
        }
    }
}
