//! Keyed-expiry store for short-lived USSD interaction state
//!
//! Process-local fallback; a multi-process deployment would swap this for a
//! shared cache. Nothing in the ledger's correctness depends on it.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use lazy_static::lazy_static;
use tokio::sync::Mutex;

lazy_static! {
    // Session payload plus its expiry instant, keyed by an external id
    static ref SESSIONS: Mutex<HashMap<String, (String, u64)>> =
        Mutex::new(HashMap::new());
}

pub const SESSION_TTL_SECONDS: u64 = 300;

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Store a session payload under a key, resetting its TTL.
pub async fn put(key: &str, value: String) {
    put_at(key, value, now_epoch()).await
}

/// Fetch a session payload if it has not expired. Expired entries are
/// dropped on access.
pub async fn get(key: &str) -> Option<String> {
    get_at(key, now_epoch()).await
}

/// Drop a session outright (e.g. when a USSD flow completes).
pub async fn remove(key: &str) {
    SESSIONS.lock().await.remove(key);
}

async fn put_at(key: &str, value: String, now: u64) {
    let mut sessions = SESSIONS.lock().await;
    // Opportunistically sweep anything already expired
    sessions.retain(|_, (_, expires)| *expires > now);
    sessions.insert(key.to_string(), (value, now + SESSION_TTL_SECONDS));
}

async fn get_at(key: &str, now: u64) -> Option<String> {
    let mut sessions = SESSIONS.lock().await;
    match sessions.get(key) {
        Some((value, expires)) if *expires > now => Some(value.clone()),
        Some(_) => {
            sessions.remove(key);
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_value_survives_within_ttl() {
        put_at("session-a", "menu:1".to_string(), 100).await;
        assert_eq!(
            get_at("session-a", 100 + SESSION_TTL_SECONDS - 1).await,
            Some("menu:1".to_string())
        );
    }

    #[tokio::test]
    async fn test_value_expires_after_ttl() {
        put_at("session-b", "menu:2".to_string(), 200).await;
        assert_eq!(get_at("session-b", 200 + SESSION_TTL_SECONDS).await, None);
        // A second read after expiry still sees nothing
        assert_eq!(get_at("session-b", 201 + SESSION_TTL_SECONDS).await, None);
    }

    #[tokio::test]
    async fn test_remove_drops_a_live_session() {
        put_at("session-c", "menu:3".to_string(), 300).await;
        remove("session-c").await;
        assert_eq!(get_at("session-c", 301).await, None);
    }
}
