use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use lazy_static::lazy_static;
use tokio::sync::Mutex;

lazy_static! {
    // Submission timestamps per client id, pruned to the sliding window on access
    static ref SUBMISSION_LOG: Mutex<HashMap<String, Vec<u64>>> =
        Mutex::new(HashMap::new());
}

pub const MAX_SUBMISSIONS_PER_WINDOW: usize = 5;
pub const WINDOW_SECONDS: u64 = 3600;

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Check whether a client may submit right now.
/// Returns Ok(()) when under the limit, Err(retry_after_seconds) otherwise.
/// Does not count the attempt; call record_submission after the entry is
/// actually created.
pub async fn check_submission_allowed(client_id: &str) -> Result<(), u64> {
    check_at(client_id, now_epoch()).await
}

/// Count a successful submission against the client's window.
pub async fn record_submission(client_id: &str) {
    record_at(client_id, now_epoch()).await
}

async fn check_at(client_id: &str, now: u64) -> Result<(), u64> {
    let window_start = now.saturating_sub(WINDOW_SECONDS);
    let mut log = SUBMISSION_LOG.lock().await;

    if let Some(timestamps) = log.get_mut(client_id) {
        // Remove submissions outside the sliding window
        timestamps.retain(|&t| t > window_start);

        if timestamps.len() >= MAX_SUBMISSIONS_PER_WINDOW {
            // Window full; report when the oldest submission ages out
            let oldest = timestamps[0];
            let retry_after = (oldest + WINDOW_SECONDS).saturating_sub(now);
            return Err(retry_after);
        }
    }

    Ok(())
}

async fn record_at(client_id: &str, now: u64) {
    let mut log = SUBMISSION_LOG.lock().await;
    log.entry(client_id.to_string()).or_default().push(now);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit_then_refuses() {
        let id = "client-ratelimit-a";
        let now = 1_000_000;
        for _ in 0..MAX_SUBMISSIONS_PER_WINDOW {
            assert!(check_at(id, now).await.is_ok());
            record_at(id, now).await;
        }
        let err = check_at(id, now).await.unwrap_err();
        assert_eq!(err, WINDOW_SECONDS);
    }

    #[tokio::test]
    async fn test_old_submissions_age_out_of_the_window() {
        let id = "client-ratelimit-b";
        let now = 2_000_000;
        for _ in 0..MAX_SUBMISSIONS_PER_WINDOW {
            record_at(id, now).await;
        }
        assert!(check_at(id, now).await.is_err());
        // One second past the window the whole batch has expired
        assert!(check_at(id, now + WINDOW_SECONDS + 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_clients_are_limited_independently() {
        let now = 3_000_000;
        for _ in 0..MAX_SUBMISSIONS_PER_WINDOW {
            record_at("client-ratelimit-c", now).await;
        }
        assert!(check_at("client-ratelimit-c", now).await.is_err());
        assert!(check_at("client-ratelimit-d", now).await.is_ok());
    }
}
