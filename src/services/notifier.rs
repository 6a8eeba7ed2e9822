use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::services::validator::DUPLICATE_REASON;

/// Who a notification should be delivered to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Recipient {
    Collector(String),
    Client(String),
}

/// Ledger events that fan out as push notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    PaymentSubmitted,
    DuplicateSubmission,
    PaymentConfirmed,
    PaymentQueried,
    PaymentRejected,
    PayoutRequested,
    PayoutApproved,
    PayoutDeclined,
    DailyReminder,
}

/// One notification ready for the delivery worker
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub event: NotificationEvent,
    pub recipient: Recipient,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn payment_submitted(collector_id: &str, client_name: &str, amount: f64) -> Self {
        Notification {
            event: NotificationEvent::PaymentSubmitted,
            recipient: Recipient::Collector(collector_id.to_string()),
            title: "New payment".to_string(),
            body: format!("{} submitted GHS {:.2}. Tap to review.", client_name, amount),
        }
    }

    pub fn duplicate_submission(client_id: &str) -> Self {
        Notification {
            event: NotificationEvent::DuplicateSubmission,
            recipient: Recipient::Client(client_id.to_string()),
            title: "Submission rejected".to_string(),
            body: DUPLICATE_REASON.to_string(),
        }
    }

    pub fn payment_confirmed(client_id: &str, amount: f64, balance: f64) -> Self {
        Notification {
            event: NotificationEvent::PaymentConfirmed,
            recipient: Recipient::Client(client_id.to_string()),
            title: "Payment confirmed".to_string(),
            body: format!(
                "GHS {:.2} confirmed. Your balance is GHS {:.2}.",
                amount, balance
            ),
        }
    }

    pub fn payment_queried(client_id: &str, amount: f64, note: &str) -> Self {
        Notification {
            event: NotificationEvent::PaymentQueried,
            recipient: Recipient::Client(client_id.to_string()),
            title: "Payment queried".to_string(),
            body: format!("Your payment of GHS {:.2} was queried: {}", amount, note),
        }
    }

    pub fn payment_rejected(client_id: &str, amount: f64, note: &str) -> Self {
        Notification {
            event: NotificationEvent::PaymentRejected,
            recipient: Recipient::Client(client_id.to_string()),
            title: "Payment rejected".to_string(),
            body: format!("Your payment of GHS {:.2} was rejected: {}", amount, note),
        }
    }

    pub fn payout_requested(collector_id: &str, client_name: &str, amount: f64) -> Self {
        Notification {
            event: NotificationEvent::PayoutRequested,
            recipient: Recipient::Collector(collector_id.to_string()),
            title: "Payout requested".to_string(),
            body: format!("{} requested a payout of GHS {:.2}.", client_name, amount),
        }
    }

    pub fn payout_approved(client_id: &str, amount: f64) -> Self {
        Notification {
            event: NotificationEvent::PayoutApproved,
            recipient: Recipient::Client(client_id.to_string()),
            title: "Payout approved".to_string(),
            body: format!("Your payout of GHS {:.2} was approved.", amount),
        }
    }

    pub fn payout_declined(client_id: &str, amount: f64, reason: &str) -> Self {
        Notification {
            event: NotificationEvent::PayoutDeclined,
            recipient: Recipient::Client(client_id.to_string()),
            title: "Payout declined".to_string(),
            body: format!("Your payout of GHS {:.2} was declined: {}", amount, reason),
        }
    }

    pub fn daily_reminder(client_id: &str, contribution_amount: f64) -> Self {
        Notification {
            event: NotificationEvent::DailyReminder,
            recipient: Recipient::Client(client_id.to_string()),
            title: "Daily contribution".to_string(),
            body: format!(
                "Remember to submit your contribution of GHS {:.2} today.",
                contribution_amount
            ),
        }
    }
}

/// Fire-and-forget dispatcher handing notifications to a delivery worker.
///
/// The worker (push/SMS transport) lives in the calling layer and drains the
/// receiver half. Dispatch never blocks and never fails: a missing worker is
/// logged and the ledger mutation it followed stands.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Option<UnboundedSender<Notification>>,
}

impl Notifier {
    /// Dispatcher wired to a channel whose receiver a delivery worker drains
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Notifier { tx: Some(tx) }, rx)
    }

    /// Dispatcher that swallows every event (tests, offline tooling)
    pub fn disabled() -> Self {
        Notifier { tx: None }
    }

    pub fn dispatch(&self, notification: Notification) {
        match &self.tx {
            Some(tx) => {
                if let Err(e) = tx.send(notification) {
                    warn!("Notification dropped, delivery worker gone: {}", e);
                }
            }
            None => {
                debug!("Notification dispatch disabled, dropping {:?}", notification.event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_dispatch_reaches_the_receiver() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.dispatch(Notification::payment_submitted("col-1", "Kwame Mensah", 50.0));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.event, NotificationEvent::PaymentSubmitted);
        assert_eq!(received.recipient, Recipient::Collector("col-1".to_string()));
        assert!(received.body.contains("GHS 50.00"));
    }

    #[test]
    fn test_disabled_dispatch_is_a_no_op() {
        let notifier = Notifier::disabled();
        notifier.dispatch(Notification::payout_approved("cli-1", 25.0));
    }

    #[test]
    fn test_dispatch_survives_a_dropped_receiver() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.dispatch(Notification::payment_confirmed("cli-1", 10.0, 30.0));
    }

    #[test]
    fn test_message_bodies_name_the_values() {
        let queried = Notification::payment_queried("cli-1", 20.0, "Wrong number?");
        assert_eq!(
            queried.body,
            "Your payment of GHS 20.00 was queried: Wrong number?"
        );

        let declined = Notification::payout_declined("cli-1", 75.5, "Cycle not due");
        assert_eq!(
            declined.body,
            "Your payout of GHS 75.50 was declined: Cycle not due"
        );

        let duplicate = Notification::duplicate_submission("cli-2");
        assert_eq!(duplicate.body, DUPLICATE_REASON);

        let reminder = Notification::daily_reminder("cli-3", 5.0);
        assert_eq!(
            reminder.body,
            "Remember to submit your contribution of GHS 5.00 today."
        );

        let requested = Notification::payout_requested("col-1", "Ama Serwaa", 40.0);
        assert_eq!(requested.recipient, Recipient::Collector("col-1".to_string()));
        assert_eq!(requested.body, "Ama Serwaa requested a payout of GHS 40.00.");
    }
}
