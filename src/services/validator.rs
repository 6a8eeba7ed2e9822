use chrono::{Duration, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::mysql::MySqlPool;

use crate::db;
use crate::models::{Collector, FlagSeverity, TrustLevel, ValidationFlag};
use crate::services::sms_parser::ParsedSms;

pub const MAX_EVIDENCE_AGE_HOURS: i64 = 48;

pub const DUPLICATE_REASON: &str = "This transaction has already been submitted.";

/// Result of running the submission checks over parsed evidence
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub auto_reject: bool,
    pub auto_reject_reason: Option<String>,
    pub flags: Vec<ValidationFlag>,
    pub trust_level: TrustLevel,
}

impl ValidationOutcome {
    /// Fatal outcome for a provider reference that is already on the ledger
    pub fn duplicate() -> Self {
        ValidationOutcome {
            auto_reject: true,
            auto_reject_reason: Some(DUPLICATE_REASON.to_string()),
            flags: Vec::new(),
            trust_level: TrustLevel::AutoRejected,
        }
    }
}

/// Validate an SMS submission against the ledger and the collector context.
///
/// The duplicate check runs first and short-circuits: a momo ref that is
/// already stored anywhere in the system auto-rejects the submission before
/// the heuristic checks run.
pub async fn validate_submission(
    pool: &MySqlPool,
    parsed: &ParsedSms,
    collector: &Collector,
) -> Result<ValidationOutcome, sqlx::Error> {
    if let Some(momo_ref) = &parsed.momo_ref {
        if db::transaction::momo_ref_exists(pool, momo_ref).await? {
            return Ok(ValidationOutcome::duplicate());
        }
    }

    Ok(evaluate_flags(
        parsed,
        collector.momo_number.as_deref(),
        Utc::now().naive_utc(),
    ))
}

/// The non-fatal heuristic checks, independent of the ledger.
///
/// Raises a HIGH flag when the parsed recipient phone differs from the
/// collector's registered MoMo number (a collector with no registered
/// number fails this check for any parsed phone), and a MEDIUM flag when
/// the claimed timestamp is older than 48 hours. The parsed timestamp is
/// naive and is compared directly against naive UTC now.
pub fn evaluate_flags(
    parsed: &ParsedSms,
    collector_momo: Option<&str>,
    now: NaiveDateTime,
) -> ValidationOutcome {
    let mut flags = Vec::new();

    if let Some(phone) = &parsed.recipient_phone {
        if collector_momo != Some(phone.as_str()) {
            flags.push(ValidationFlag {
                field: "recipient_phone".to_string(),
                message: "Recipient number does not match your MoMo number".to_string(),
                severity: FlagSeverity::High,
            });
        }
    }

    if let Some(date) = parsed.transaction_date {
        let age = now - date;
        if age > Duration::hours(MAX_EVIDENCE_AGE_HOURS) {
            flags.push(ValidationFlag {
                field: "date".to_string(),
                message: format!("Transaction is {} day(s) old", age.num_days()),
                severity: FlagSeverity::Medium,
            });
        }
    }

    let trust_level = if flags.is_empty() {
        TrustLevel::High
    } else {
        TrustLevel::Medium
    };

    ValidationOutcome {
        auto_reject: false,
        auto_reject_reason: None,
        flags,
        trust_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sms_parser::{ParseConfidence, ParsedSms};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn parsed(phone: Option<&str>, date: Option<NaiveDateTime>) -> ParsedSms {
        ParsedSms {
            amount: Some(50.0),
            recipient_name: Some("KWAME MENSAH".to_string()),
            recipient_phone: phone.map(str::to_string),
            momo_ref: Some("9876543210".to_string()),
            transaction_date: date,
            confidence: ParseConfidence::High,
        }
    }

    #[test]
    fn test_clean_evidence_gets_high_trust() {
        let evidence = parsed(Some("0244123456"), Some(now() - Duration::hours(2)));
        let outcome = evaluate_flags(&evidence, Some("0244123456"), now());
        assert!(!outcome.auto_reject);
        assert!(outcome.flags.is_empty());
        assert_eq!(outcome.trust_level, TrustLevel::High);
    }

    #[test]
    fn test_phone_mismatch_raises_high_flag_and_medium_trust() {
        let evidence = parsed(Some("0551112223"), Some(now() - Duration::hours(1)));
        let outcome = evaluate_flags(&evidence, Some("0244123456"), now());
        assert_eq!(outcome.flags.len(), 1);
        assert_eq!(outcome.flags[0].field, "recipient_phone");
        assert_eq!(outcome.flags[0].severity, FlagSeverity::High);
        assert_eq!(outcome.trust_level, TrustLevel::Medium);
    }

    #[test]
    fn test_unregistered_collector_number_counts_as_mismatch() {
        let evidence = parsed(Some("0244123456"), None);
        let outcome = evaluate_flags(&evidence, None, now());
        assert_eq!(outcome.flags.len(), 1);
        assert_eq!(outcome.flags[0].field, "recipient_phone");
    }

    #[test]
    fn test_absent_phone_skips_the_phone_check() {
        let evidence = parsed(None, Some(now() - Duration::hours(1)));
        let outcome = evaluate_flags(&evidence, Some("0244123456"), now());
        assert!(outcome.flags.is_empty());
        assert_eq!(outcome.trust_level, TrustLevel::High);
    }

    #[test]
    fn test_stale_evidence_raises_medium_flag_naming_age_in_days() {
        let evidence = parsed(Some("0244123456"), Some(now() - Duration::days(3)));
        let outcome = evaluate_flags(&evidence, Some("0244123456"), now());
        assert_eq!(outcome.flags.len(), 1);
        assert_eq!(outcome.flags[0].field, "date");
        assert_eq!(outcome.flags[0].severity, FlagSeverity::Medium);
        assert_eq!(outcome.flags[0].message, "Transaction is 3 day(s) old");
        assert_eq!(outcome.trust_level, TrustLevel::Medium);
    }

    #[test]
    fn test_exactly_48_hours_is_still_fresh() {
        let evidence = parsed(Some("0244123456"), Some(now() - Duration::hours(48)));
        let outcome = evaluate_flags(&evidence, Some("0244123456"), now());
        assert!(outcome.flags.is_empty());

        let evidence = parsed(Some("0244123456"), Some(now() - Duration::hours(49)));
        let outcome = evaluate_flags(&evidence, Some("0244123456"), now());
        assert_eq!(outcome.flags.len(), 1);
    }

    #[test]
    fn test_flags_accumulate_in_check_order() {
        let evidence = parsed(Some("0551112223"), Some(now() - Duration::days(4)));
        let outcome = evaluate_flags(&evidence, Some("0244123456"), now());
        assert_eq!(outcome.flags.len(), 2);
        assert_eq!(outcome.flags[0].field, "recipient_phone");
        assert_eq!(outcome.flags[1].field, "date");
        assert_eq!(outcome.trust_level, TrustLevel::Medium);
    }

    #[test]
    fn test_duplicate_outcome_shape() {
        let outcome = ValidationOutcome::duplicate();
        assert!(outcome.auto_reject);
        assert_eq!(outcome.auto_reject_reason.as_deref(), Some(DUPLICATE_REASON));
        assert!(outcome.flags.is_empty());
        assert_eq!(outcome.trust_level, TrustLevel::AutoRejected);
    }

    #[test]
    fn test_future_dated_evidence_is_not_flagged() {
        let evidence = parsed(Some("0244123456"), Some(now() + Duration::hours(5)));
        let outcome = evaluate_flags(&evidence, Some("0244123456"), now());
        assert!(outcome.flags.is_empty());
    }
}
