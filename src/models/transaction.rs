//! Ledger entry models
//!
//! A transaction is one claimed deposit. It is created by a submission call,
//! mutated only through the collector actions (confirm/query/reject) and
//! never deleted. Status strings are stored verbatim in MySQL, so `as_str`
//! and `FromStr` are the single source of truth for the wire form.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How a deposit claim entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionType {
    SmsText,
    Screenshot,
}

impl SubmissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionType::SmsText => "SMS_TEXT",
            SubmissionType::Screenshot => "SCREENSHOT",
        }
    }
}

impl FromStr for SubmissionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SMS_TEXT" => Ok(SubmissionType::SmsText),
            "SCREENSHOT" => Ok(SubmissionType::Screenshot),
            other => Err(format!("unknown submission type '{}'", other)),
        }
    }
}

/// How much a submitted deposit claim can be believed before confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustLevel {
    High,
    Medium,
    Low,
    AutoRejected,
}

impl TrustLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustLevel::High => "HIGH",
            TrustLevel::Medium => "MEDIUM",
            TrustLevel::Low => "LOW",
            TrustLevel::AutoRejected => "AUTO_REJECTED",
        }
    }
}

impl FromStr for TrustLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(TrustLevel::High),
            "MEDIUM" => Ok(TrustLevel::Medium),
            "LOW" => Ok(TrustLevel::Low),
            "AUTO_REJECTED" => Ok(TrustLevel::AutoRejected),
            other => Err(format!("unknown trust level '{}'", other)),
        }
    }
}

/// Lifecycle state of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Queried,
    Confirmed,
    Rejected,
    AutoRejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Queried => "QUERIED",
            TransactionStatus::Confirmed => "CONFIRMED",
            TransactionStatus::Rejected => "REJECTED",
            TransactionStatus::AutoRejected => "AUTO_REJECTED",
        }
    }

    /// Confirm is legal from PENDING or QUERIED.
    pub fn can_confirm(&self) -> bool {
        matches!(self, TransactionStatus::Pending | TransactionStatus::Queried)
    }

    /// Query is legal only from PENDING.
    pub fn can_query(&self) -> bool {
        matches!(self, TransactionStatus::Pending)
    }

    /// Reject is legal only from QUERIED; a pending entry must be queried
    /// first so the collector leaves a documented reason.
    pub fn can_reject(&self) -> bool {
        matches!(self, TransactionStatus::Queried)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "QUERIED" => Ok(TransactionStatus::Queried),
            "CONFIRMED" => Ok(TransactionStatus::Confirmed),
            "REJECTED" => Ok(TransactionStatus::Rejected),
            "AUTO_REJECTED" => Ok(TransactionStatus::AutoRejected),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

/// Severity of a non-fatal validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlagSeverity {
    High,
    Medium,
}

/// One non-fatal warning raised by the submission validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFlag {
    pub field: String,
    pub message: String,
    pub severity: FlagSeverity,
}

/// A persisted deposit claim
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: String,
    pub collector_id: String,
    pub client_id: String,
    pub amount: f64,
    /// Provider transaction id parsed from the SMS; globally unique when
    /// present and never stored for an auto-rejected entry.
    pub momo_ref: Option<String>,
    pub submission_type: SubmissionType,
    pub trust_level: TrustLevel,
    pub status: TransactionStatus,
    pub validation_flags: Option<Vec<ValidationFlag>>,
    pub raw_sms_text: Option<String>,
    pub screenshot_key: Option<String>,
    pub collector_note: Option<String>,
    pub submitted_at: NaiveDateTime,
    pub confirmed_at: Option<NaiveDateTime>,
}

/// One row in a collector listing, joined with the client's name
#[derive(Debug, Clone, Serialize)]
pub struct TransactionFeedItem {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub amount: f64,
    pub submission_type: SubmissionType,
    pub trust_level: TrustLevel,
    pub status: TransactionStatus,
    pub validation_flags: Option<Vec<ValidationFlag>>,
    pub collector_note: Option<String>,
    pub submitted_at: NaiveDateTime,
    pub confirmed_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_legal_from_pending_and_queried_only() {
        assert!(TransactionStatus::Pending.can_confirm());
        assert!(TransactionStatus::Queried.can_confirm());
        assert!(!TransactionStatus::Confirmed.can_confirm());
        assert!(!TransactionStatus::Rejected.can_confirm());
        assert!(!TransactionStatus::AutoRejected.can_confirm());
    }

    #[test]
    fn test_query_legal_from_pending_only() {
        assert!(TransactionStatus::Pending.can_query());
        assert!(!TransactionStatus::Queried.can_query());
        assert!(!TransactionStatus::Confirmed.can_query());
    }

    #[test]
    fn test_reject_legal_from_queried_only() {
        assert!(TransactionStatus::Queried.can_reject());
        assert!(!TransactionStatus::Pending.can_reject());
        assert!(!TransactionStatus::Confirmed.can_reject());
        assert!(!TransactionStatus::AutoRejected.can_reject());
    }

    #[test]
    fn test_status_strings_round_trip() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Queried,
            TransactionStatus::Confirmed,
            TransactionStatus::Rejected,
            TransactionStatus::AutoRejected,
        ] {
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(status));
        }
        assert!("CANCELLED".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn test_validation_flag_serializes_with_uppercase_severity() {
        let flag = ValidationFlag {
            field: "recipient_phone".to_string(),
            message: "Recipient number does not match your MoMo number".to_string(),
            severity: FlagSeverity::High,
        };
        let json = serde_json::to_string(&flag).unwrap();
        assert!(json.contains("\"severity\":\"HIGH\""));
        let back: ValidationFlag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flag);
    }
}
