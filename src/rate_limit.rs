// =============================================================================
// Client Rate Limiter — sliding windows per hashed client identity
// =============================================================================
//
// Each client (a salted SHA-256 hash of its IP) gets an in-memory list of
// request timestamps.  Two sliding windows are enforced: requests per minute
// and requests per hour.  Timestamps are passed in by the caller (unix
// seconds) so the limiter has no clock dependency and tests never sleep.
//
// Memory is bounded by pruning: recording a request drops timestamps older
// than the hour window, and a periodic `cleanup` removes clients idle for
// longer than an hour.
// =============================================================================

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Window sizes in seconds.
const MINUTE_WINDOW: i64 = 60;
const HOUR_WINDOW: i64 = 3600;

/// Requests left in each window, reported to throttled clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemainingRequests {
    pub minute: u32,
    pub hour: u32,
}

/// Sliding-window request throttle keyed by client identity.
pub struct ClientRateLimiter {
    enabled: bool,
    requests_per_minute: u32,
    requests_per_hour: u32,
    /// Request timestamps (unix seconds, ascending) per client.
    clients: RwLock<HashMap<String, Vec<i64>>>,
}

impl ClientRateLimiter {
    pub fn new(enabled: bool, requests_per_minute: u32, requests_per_hour: u32) -> Self {
        Self {
            enabled,
            requests_per_minute,
            requests_per_hour,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Whether `client` may make another request at time `now`.
    ///
    /// Both windows must have headroom; a disabled limiter always allows.
    pub fn is_allowed(&self, client: &str, now: i64) -> bool {
        if !self.enabled {
            return true;
        }

        let clients = self.clients.read();
        let timestamps = match clients.get(client) {
            Some(ts) => ts,
            None => return true,
        };

        let minute_count = count_since(timestamps, now - MINUTE_WINDOW);
        if minute_count >= self.requests_per_minute {
            debug!(client, minute_count, "request blocked by minute window");
            return false;
        }

        let hour_count = count_since(timestamps, now - HOUR_WINDOW);
        if hour_count >= self.requests_per_hour {
            debug!(client, hour_count, "request blocked by hour window");
            return false;
        }

        true
    }

    /// Record a request for `client` at time `now`, pruning timestamps that
    /// have left the hour window.
    pub fn record_request(&self, client: &str, now: i64) {
        if !self.enabled {
            return;
        }

        let mut clients = self.clients.write();
        let timestamps = clients.entry(client.to_string()).or_default();
        timestamps.retain(|&ts| ts > now - HOUR_WINDOW);
        timestamps.push(now);
    }

    /// Requests remaining in each window for `client` at time `now`.
    pub fn remaining(&self, client: &str, now: i64) -> RemainingRequests {
        if !self.enabled {
            return RemainingRequests {
                minute: self.requests_per_minute,
                hour: self.requests_per_hour,
            };
        }

        let clients = self.clients.read();
        let (minute_count, hour_count) = match clients.get(client) {
            Some(ts) => (
                count_since(ts, now - MINUTE_WINDOW),
                count_since(ts, now - HOUR_WINDOW),
            ),
            None => (0, 0),
        };

        RemainingRequests {
            minute: self.requests_per_minute.saturating_sub(minute_count),
            hour: self.requests_per_hour.saturating_sub(hour_count),
        }
    }

    /// Drop clients whose newest request is older than the hour window.
    /// Returns how many clients were removed.
    pub fn cleanup(&self, now: i64) -> usize {
        let mut clients = self.clients.write();
        let before = clients.len();
        clients.retain(|_, timestamps| timestamps.iter().any(|&ts| ts > now - HOUR_WINDOW));
        let removed = before - clients.len();
        if removed > 0 {
            debug!(removed, "idle rate-limit clients dropped");
        }
        removed
    }
}

/// Derive the rate-limit identity for a client IP.
///
/// The salt keeps raw IPs out of logs and memory dumps without needing a
/// reversible mapping.
pub fn client_id(ip: &str, salt: &str) -> String {
    hex::encode(Sha256::digest(format!("{ip}{salt}").as_bytes()))
}

fn count_since(timestamps: &[i64], cutoff: i64) -> u32 {
    timestamps.iter().filter(|&&ts| ts > cutoff).count() as u32
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn under_limit_is_allowed() {
        let limiter = ClientRateLimiter::new(true, 3, 100);
        for i in 0..2 {
            assert!(limiter.is_allowed("c1", NOW + i));
            limiter.record_request("c1", NOW + i);
        }
        assert!(limiter.is_allowed("c1", NOW + 2));
    }

    #[test]
    fn minute_window_blocks_at_limit() {
        let limiter = ClientRateLimiter::new(true, 3, 100);
        for i in 0..3 {
            limiter.record_request("c1", NOW + i);
        }
        assert!(!limiter.is_allowed("c1", NOW + 3));
        // A different client is unaffected.
        assert!(limiter.is_allowed("c2", NOW + 3));
    }

    #[test]
    fn minute_window_slides() {
        let limiter = ClientRateLimiter::new(true, 3, 100);
        for i in 0..3 {
            limiter.record_request("c1", NOW + i);
        }
        assert!(!limiter.is_allowed("c1", NOW + 3));
        // 61 seconds after the first request it has left the minute window.
        assert!(limiter.is_allowed("c1", NOW + 61));
    }

    #[test]
    fn hour_window_blocks_independently() {
        let limiter = ClientRateLimiter::new(true, 100, 5);
        // Spread 5 requests over 5 minutes: minute window never fills.
        for i in 0..5 {
            limiter.record_request("c1", NOW + i * 60);
        }
        assert!(!limiter.is_allowed("c1", NOW + 5 * 60));
        // After the first request ages out of the hour window, allowed again.
        assert!(limiter.is_allowed("c1", NOW + HOUR_WINDOW + 1));
    }

    #[test]
    fn disabled_limiter_always_allows() {
        let limiter = ClientRateLimiter::new(false, 1, 1);
        for i in 0..10 {
            assert!(limiter.is_allowed("c1", NOW + i));
            limiter.record_request("c1", NOW + i);
        }
        assert_eq!(
            limiter.remaining("c1", NOW + 10),
            RemainingRequests { minute: 1, hour: 1 }
        );
    }

    #[test]
    fn remaining_counts_both_windows() {
        let limiter = ClientRateLimiter::new(true, 10, 20);
        assert_eq!(
            limiter.remaining("c1", NOW),
            RemainingRequests { minute: 10, hour: 20 }
        );

        for i in 0..4 {
            limiter.record_request("c1", NOW + i);
        }
        assert_eq!(
            limiter.remaining("c1", NOW + 4),
            RemainingRequests { minute: 6, hour: 16 }
        );

        // A minute later the minute window is clear, the hour window is not.
        assert_eq!(
            limiter.remaining("c1", NOW + 70),
            RemainingRequests { minute: 10, hour: 16 }
        );
    }

    #[test]
    fn cleanup_drops_idle_clients_only() {
        let limiter = ClientRateLimiter::new(true, 10, 20);
        limiter.record_request("idle", NOW);
        limiter.record_request("active", NOW + HOUR_WINDOW);

        let removed = limiter.cleanup(NOW + HOUR_WINDOW + 1);
        assert_eq!(removed, 1);
        // The active client's history survives.
        assert_eq!(
            limiter.remaining("active", NOW + HOUR_WINDOW + 1).hour,
            19
        );
    }

    #[test]
    fn record_prunes_old_timestamps() {
        let limiter = ClientRateLimiter::new(true, 10, 20);
        limiter.record_request("c1", NOW);
        // Recording far in the future drops the stale entry.
        limiter.record_request("c1", NOW + 2 * HOUR_WINDOW);
        assert_eq!(
            limiter.remaining("c1", NOW + 2 * HOUR_WINDOW).hour,
            19
        );
    }

    #[test]
    fn client_id_is_stable_and_salted() {
        let a = client_id("10.0.0.1", "salt_a");
        let b = client_id("10.0.0.1", "salt_a");
        let c = client_id("10.0.0.1", "salt_b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64); // sha256 hex
    }
}
