//! Sliding-window request counter
//!
//! One record per client key, all behind a single mutex. The limiter never
//! suspends: a check is one short critical section, so the read-modify-write
//! on a client's record is atomic with respect to concurrent requests.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::SystemTime;

use super::config::RateLimitConfig;

/// Client key used when the peer address cannot be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Snapshot reported on every response via the `X-RateLimit-*` headers
#[derive(Clone, Debug)]
pub struct RateLimitStatus {
	pub limit: u32,
	/// `max(0, limit - count)`
	pub remaining: u32,
	/// When the client's window expires
	pub reset_at: DateTime<Utc>,
}

/// Outcome of one rate limit check
#[derive(Clone, Debug)]
pub enum Decision {
	Allowed(RateLimitStatus),
	Limited {
		status: RateLimitStatus,
		/// `ceil((reset_at - now) / 1s)`, always > 0 while the window holds
		retry_after_secs: u64,
	},
}

#[derive(Debug)]
struct RateLimitRecord {
	count: u32,
	window_reset_at: SystemTime,
}

#[derive(Debug)]
pub struct RateLimiter {
	config: RateLimitConfig,
	store: Mutex<HashMap<Box<str>, RateLimitRecord>>,
}

impl RateLimiter {
	pub fn new(config: RateLimitConfig) -> Self {
		Self { config, store: Mutex::new(HashMap::new()) }
	}

	pub fn config(&self) -> &RateLimitConfig {
		&self.config
	}

	/// Number of client keys currently tracked
	pub fn tracked_clients(&self) -> usize {
		self.store.lock().len()
	}

	/// Count one request from `key` against the current window
	pub fn check(&self, key: &str) -> Decision {
		self.check_at(key, SystemTime::now())
	}

	fn check_at(&self, key: &str, now: SystemTime) -> Decision {
		let limit = self.config.max_requests;

		let (count, window_reset_at) = {
			let mut store = self.store.lock();

			// Opportunistic purge of every expired record, the current key's
			// included: an expired window always restarts at count = 1. This
			// substitutes for a background sweep and bounds memory growth.
			store.retain(|_, record| record.window_reset_at > now);

			match store.get_mut(key) {
				Some(record) => {
					record.count += 1;
					(record.count, record.window_reset_at)
				}
				None => {
					let window_reset_at = now + self.config.window;
					store.insert(key.into(), RateLimitRecord { count: 1, window_reset_at });
					(1, window_reset_at)
				}
			}
		};

		let status = RateLimitStatus {
			limit,
			remaining: limit.saturating_sub(count),
			reset_at: window_reset_at.into(),
		};

		if count > limit {
			let wait = window_reset_at.duration_since(now).unwrap_or_default();
			let retry_after_secs = wait.as_millis().div_ceil(1000) as u64;
			Decision::Limited { status, retry_after_secs }
		} else {
			Decision::Allowed(status)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::{Duration, UNIX_EPOCH};

	fn limiter(window_ms: u64, max_requests: u32) -> RateLimiter {
		RateLimiter::new(RateLimitConfig::new(window_ms, max_requests))
	}

	fn at(ms: u64) -> SystemTime {
		UNIX_EPOCH + Duration::from_millis(1_700_000_000_000 + ms)
	}

	fn remaining(decision: &Decision) -> u32 {
		match decision {
			Decision::Allowed(status) => status.remaining,
			Decision::Limited { status, .. } => status.remaining,
		}
	}

	#[test]
	fn counts_three_requests_per_window() {
		let rl = limiter(1000, 3);

		// three requests at t=0: all forwarded, remaining 2, 1, 0
		for expected in [2, 1, 0] {
			let decision = rl.check_at("a", at(0));
			assert!(matches!(decision, Decision::Allowed(_)));
			assert_eq!(remaining(&decision), expected);
		}

		// 4th request mid-window: rejected, retryAfter rounds up to 1s
		match rl.check_at("a", at(500)) {
			Decision::Limited { status, retry_after_secs } => {
				assert_eq!(status.remaining, 0);
				assert_eq!(retry_after_secs, 1);
			}
			Decision::Allowed(_) => panic!("4th request must be rejected"),
		}

		// 5th request after the window: fresh window, remaining 2
		let decision = rl.check_at("a", at(1100));
		assert!(matches!(decision, Decision::Allowed(_)));
		assert_eq!(remaining(&decision), 2);
	}

	#[test]
	fn remaining_is_monotonic_and_never_negative() {
		let rl = limiter(60_000, 3);
		let mut last = u32::MAX;
		for i in 0..10 {
			let decision = rl.check_at("a", at(i * 10));
			let rem = remaining(&decision);
			assert!(rem <= last, "remaining must not increase within a window");
			last = rem;
		}
		assert_eq!(last, 0);
	}

	#[test]
	fn distinct_clients_do_not_interact() {
		let rl = limiter(60_000, 2);
		assert!(matches!(rl.check_at("a", at(0)), Decision::Allowed(_)));
		assert!(matches!(rl.check_at("a", at(0)), Decision::Allowed(_)));
		assert!(matches!(rl.check_at("a", at(0)), Decision::Limited { .. }));

		// "b" still gets a full budget
		let decision = rl.check_at("b", at(0));
		assert!(matches!(decision, Decision::Allowed(_)));
		assert_eq!(remaining(&decision), 1);
	}

	#[test]
	fn expired_window_resets_even_after_a_burst() {
		// the client burns its budget, then comes back after the window;
		// the stale record must not carry its old count
		let rl = limiter(1000, 2);
		for _ in 0..5 {
			rl.check_at("a", at(0));
		}
		let decision = rl.check_at("a", at(1001));
		assert!(matches!(decision, Decision::Allowed(_)));
		assert_eq!(remaining(&decision), 1);
	}

	#[test]
	fn purge_drops_expired_records_of_other_keys() {
		let rl = limiter(1000, 5);
		rl.check_at("a", at(0));
		rl.check_at("b", at(0));
		assert_eq!(rl.tracked_clients(), 2);

		// a request from a third key after expiry sweeps both
		rl.check_at("c", at(2000));
		assert_eq!(rl.tracked_clients(), 1);
	}

	#[test]
	fn retry_after_is_positive_while_limited() {
		let rl = limiter(10_000, 1);
		rl.check_at("a", at(0));
		for ms in [1, 5000, 9999] {
			match rl.check_at("a", at(ms)) {
				Decision::Limited { retry_after_secs, .. } => assert!(retry_after_secs > 0),
				Decision::Allowed(_) => panic!("should stay limited inside the window"),
			}
		}
	}

	#[test]
	fn reset_timestamp_is_window_start_plus_window() {
		let rl = limiter(900_000, 100);
		let decision = rl.check_at("a", at(0));
		let Decision::Allowed(status) = decision else { panic!("first request allowed") };
		let expected: DateTime<Utc> = (at(0) + Duration::from_millis(900_000)).into();
		assert_eq!(status.reset_at, expected);
	}
}

// vim: ts=4
