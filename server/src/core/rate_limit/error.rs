//! HTTP surface of a rate limit rejection

use axum::{
	http::{header::RETRY_AFTER, HeaderMap, HeaderName, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use chrono::SecondsFormat;
use serde_json::json;

use super::limiter::RateLimitStatus;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Insert the `X-RateLimit-*` trio into `headers`
///
/// The reset timestamp goes out as ISO-8601 with millisecond precision and a
/// `Z` suffix, matching what API clients parse with `Date.parse` style tools.
pub fn apply_status_headers(headers: &mut HeaderMap, status: &RateLimitStatus) {
	headers.insert(X_RATELIMIT_LIMIT, int_value(status.limit as u64));
	headers.insert(X_RATELIMIT_REMAINING, int_value(status.remaining as u64));
	let reset = status.reset_at.to_rfc3339_opts(SecondsFormat::Millis, true);
	if let Ok(value) = HeaderValue::from_str(&reset) {
		headers.insert(X_RATELIMIT_RESET, value);
	}
}

fn int_value(n: u64) -> HeaderValue {
	// u64 decimal digits are always valid header bytes
	HeaderValue::from_str(&n.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

/// A rejected request, convertible into the canonical 429 response
#[derive(Debug)]
pub struct RateLimitError {
	pub status: RateLimitStatus,
	pub retry_after_secs: u64,
}

impl IntoResponse for RateLimitError {
	fn into_response(self) -> Response {
		let body = Json(json!({
			"error": "Too Many Requests",
			"message": "Rate limit exceeded. Please try again later.",
			"retryAfter": self.retry_after_secs,
		}));
		let mut res = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
		apply_status_headers(res.headers_mut(), &self.status);
		res.headers_mut().insert(RETRY_AFTER, int_value(self.retry_after_secs));
		res
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};

	#[test]
	fn rejection_carries_headers_and_body_shape() {
		let status = RateLimitStatus {
			limit: 100,
			remaining: 0,
			reset_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
		};
		let res = RateLimitError { status, retry_after_secs: 42 }.into_response();

		assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
		let headers = res.headers();
		assert_eq!(headers.get(X_RATELIMIT_LIMIT).unwrap(), "100");
		assert_eq!(headers.get(X_RATELIMIT_REMAINING).unwrap(), "0");
		assert_eq!(headers.get(X_RATELIMIT_RESET).unwrap(), "2025-01-02T03:04:05.000Z");
		assert_eq!(headers.get(RETRY_AFTER).unwrap(), "42");
	}
}

// vim: ts=4
