//! Rate Limiting Configuration

use std::time::Duration;

/// Window length and request ceiling for the sliding-window limiter
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
	/// Length of one counting window
	pub window: Duration,
	/// Maximum requests per client per window
	pub max_requests: u32,
}

impl RateLimitConfig {
	pub fn new(window_ms: u64, max_requests: u32) -> Self {
		Self { window: Duration::from_millis(window_ms), max_requests }
	}

	/// Read `RATE_LIMIT_WINDOW_MS` / `RATE_LIMIT_MAX_REQUESTS` from the
	/// environment, falling back to the defaults on absent or unparsable
	/// values.
	pub fn from_env() -> Self {
		Self::from_vars(
			std::env::var("RATE_LIMIT_WINDOW_MS").ok().as_deref(),
			std::env::var("RATE_LIMIT_MAX_REQUESTS").ok().as_deref(),
		)
	}

	fn from_vars(window_ms: Option<&str>, max_requests: Option<&str>) -> Self {
		let defaults = Self::default();
		Self {
			window: window_ms
				.and_then(|v| v.parse::<u64>().ok())
				.map(Duration::from_millis)
				.unwrap_or(defaults.window),
			max_requests: max_requests
				.and_then(|v| v.parse::<u32>().ok())
				.unwrap_or(defaults.max_requests),
		}
	}
}

impl Default for RateLimitConfig {
	fn default() -> Self {
		// 100 requests per 15 minutes
		Self { window: Duration::from_millis(900_000), max_requests: 100 }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = RateLimitConfig::default();
		assert_eq!(config.window, Duration::from_millis(900_000));
		assert_eq!(config.max_requests, 100);
	}

	#[test]
	fn from_vars_parses_overrides() {
		let config = RateLimitConfig::from_vars(Some("1000"), Some("3"));
		assert_eq!(config.window, Duration::from_millis(1000));
		assert_eq!(config.max_requests, 3);
	}

	#[test]
	fn from_vars_falls_back_on_garbage() {
		let config = RateLimitConfig::from_vars(Some("soon"), None);
		assert_eq!(config.window, Duration::from_millis(900_000));
		assert_eq!(config.max_requests, 100);
	}
}

// vim: ts=4
