use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

// Field patterns for the provider's confirmation template. Each field is
// extracted independently so one malformed field never blocks the others.
lazy_static! {
    static ref AMOUNT_RE: Regex =
        Regex::new(r"(?i)sent\s+GHS\s?([\d,]+\.?\d*)").unwrap();
    static ref RECIPIENT_NAME_RE: Regex =
        Regex::new(r"(?i)sent\s+GHS[\d.,\s]+to\s+([A-Za-z\s]+?)\s*\(").unwrap();
    static ref RECIPIENT_PHONE_RE: Regex =
        Regex::new(r"(?i)to\s+[^(]+\((0\d{9})\)").unwrap();
    static ref MOMO_REF_RE: Regex =
        Regex::new(r"(?i)Transaction\s+ID[:\s]+([A-Za-z0-9]+)").unwrap();
    static ref DATE_RE: Regex =
        Regex::new(r"(?i)Date[:\s]+(\d{2}/\d{2}/\d{4}\s+\d{1,2}:\d{2}\s+[AP]M)").unwrap();
}

const DATE_FORMAT: &str = "%d/%m/%Y %I:%M %p";

/// How complete the extraction was, counted over the five fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseConfidence {
    High,
    Partial,
    Failed,
}

impl ParseConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseConfidence::High => "HIGH",
            ParseConfidence::Partial => "PARTIAL",
            ParseConfidence::Failed => "FAILED",
        }
    }
}

/// Structured evidence extracted from one confirmation SMS
#[derive(Debug, Clone, Serialize)]
pub struct ParsedSms {
    pub amount: Option<f64>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub momo_ref: Option<String>,
    pub transaction_date: Option<NaiveDateTime>,
    pub confidence: ParseConfidence,
}

/// Extract structured transaction data from a free-text confirmation SMS.
///
/// Total function: absent or malformed fields come back as None rather than
/// an error. Confidence is purely a count of extracted fields: all five give
/// HIGH, three or four give PARTIAL, anything less is FAILED.
pub fn parse_momo_sms(text: &str) -> ParsedSms {
    let amount = AMOUNT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok());

    let recipient_name = RECIPIENT_NAME_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());

    let recipient_phone = RECIPIENT_PHONE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let momo_ref = MOMO_REF_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let transaction_date = DATE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| NaiveDateTime::parse_from_str(m.as_str(), DATE_FORMAT).ok());

    let filled = [
        amount.is_some(),
        recipient_name.is_some(),
        recipient_phone.is_some(),
        momo_ref.is_some(),
        transaction_date.is_some(),
    ]
    .iter()
    .filter(|present| **present)
    .count();

    let confidence = match filled {
        5 => ParseConfidence::High,
        3 | 4 => ParseConfidence::Partial,
        _ => ParseConfidence::Failed,
    };

    ParsedSms {
        amount,
        recipient_name,
        recipient_phone,
        momo_ref,
        transaction_date,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn standard_sms() -> String {
        "Payment sent. You have sent GHS 50.00 to KWAME MENSAH (0244123456). \
         Transaction ID: 9876543210. Date: 15/08/2024 10:30 AM. \
         Current balance: GHS 120.00."
            .to_string()
    }

    #[test]
    fn test_full_sms_extracts_all_five_fields() {
        let parsed = parse_momo_sms(&standard_sms());
        assert_eq!(parsed.amount, Some(50.0));
        assert_eq!(parsed.recipient_name.as_deref(), Some("KWAME MENSAH"));
        assert_eq!(parsed.recipient_phone.as_deref(), Some("0244123456"));
        assert_eq!(parsed.momo_ref.as_deref(), Some("9876543210"));
        let expected: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 8, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parsed.transaction_date, Some(expected));
        assert_eq!(parsed.confidence, ParseConfidence::High);
    }

    #[test]
    fn test_thousands_separators_are_stripped() {
        let sms = "You have sent GHS 1,250.50 to AMA OWUSU (0551234567). \
                   Transaction ID: AB12CD34. Date: 01/02/2024 9:05 PM.";
        let parsed = parse_momo_sms(sms);
        assert_eq!(parsed.amount, Some(1250.50));
        assert_eq!(parsed.confidence, ParseConfidence::High);
    }

    #[test]
    fn test_missing_transaction_id_degrades_to_partial() {
        let sms = "You have sent GHS 20.00 to YAW DARKO (0201112223). \
                   Date: 15/08/2024 10:30 AM.";
        let parsed = parse_momo_sms(sms);
        assert_eq!(parsed.momo_ref, None);
        assert_eq!(parsed.confidence, ParseConfidence::Partial);
    }

    #[test]
    fn test_unrelated_text_fails_with_all_fields_absent() {
        let parsed = parse_momo_sms("hello, see you at the market tomorrow");
        assert_eq!(parsed.amount, None);
        assert_eq!(parsed.recipient_name, None);
        assert_eq!(parsed.recipient_phone, None);
        assert_eq!(parsed.momo_ref, None);
        assert_eq!(parsed.transaction_date, None);
        assert_eq!(parsed.confidence, ParseConfidence::Failed);
    }

    #[test]
    fn test_impossible_date_is_left_absent_without_failing_the_parse() {
        // Matches the date pattern but is not a real calendar date
        let sms = "You have sent GHS 20.00 to YAW DARKO (0201112223). \
                   Transaction ID: XYZ789. Date: 31/02/2024 10:30 AM.";
        let parsed = parse_momo_sms(sms);
        assert_eq!(parsed.transaction_date, None);
        assert_eq!(parsed.amount, Some(20.0));
        // Four extracted fields still count as PARTIAL
        assert_eq!(parsed.confidence, ParseConfidence::Partial);
    }

    #[test]
    fn test_recipient_name_is_trimmed() {
        let sms = "You have sent GHS 5.00 to Efua Mensima   (0249998887). \
                   Transaction ID: T1. Date: 15/08/2024 10:30 AM.";
        let parsed = parse_momo_sms(sms);
        assert_eq!(parsed.recipient_name.as_deref(), Some("Efua Mensima"));
    }

    #[test]
    fn test_case_insensitive_template_matching() {
        let sms = "you have SENT ghs 12.00 to ADWOA BOATENG (0209876543). \
                   transaction id: ref55. date: 15/08/2024 10:30 AM.";
        let parsed = parse_momo_sms(sms);
        assert_eq!(parsed.amount, Some(12.0));
        assert_eq!(parsed.momo_ref.as_deref(), Some("ref55"));
        assert_eq!(parsed.confidence, ParseConfidence::High);
    }
}
