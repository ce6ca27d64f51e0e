//! Middleware pipeline behavior, driven through the assembled router

mod common;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower::ServiceExt;

use common::{test_app, test_app_with};
use kaji::core::rate_limit::RateLimitConfig;

fn addr(last_octet: u8) -> SocketAddr {
	SocketAddr::from(([10, 0, 0, last_octet], 40000))
}

fn request(method: Method, uri: &str, from: SocketAddr) -> Request<Body> {
	let mut req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
	req.extensions_mut().insert(ConnectInfo(from));
	req
}

fn json_request(method: Method, uri: &str, from: SocketAddr, body: &Value) -> Request<Body> {
	let mut req = Request::builder()
		.method(method)
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.unwrap();
	req.extensions_mut().insert(ConnectInfo(from));
	req
}

async fn body_json(res: axum::response::Response) -> Value {
	let bytes = res.into_body().collect().await.unwrap().to_bytes();
	serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn security_headers_on_every_response() {
	let app = test_app();

	for uri in ["/health", "/no/such/route"] {
		let res = app.router.clone().oneshot(request(Method::GET, uri, addr(1))).await.unwrap();
		let headers = res.headers();
		assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
		assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
		assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
	}
}

#[tokio::test]
async fn rate_limit_headers_count_down() {
	let app = test_app_with(RateLimitConfig::new(60_000, 3), false);

	for expected_remaining in ["2", "1", "0"] {
		let res = app.router.clone().oneshot(request(Method::GET, "/health", addr(2))).await.unwrap();
		assert_eq!(res.status(), StatusCode::OK);
		assert_eq!(res.headers().get("x-ratelimit-limit").unwrap(), "3");
		assert_eq!(res.headers().get("x-ratelimit-remaining").unwrap(), expected_remaining);
		assert!(res.headers().contains_key("x-ratelimit-reset"));
	}
}

#[tokio::test]
async fn over_limit_request_is_rejected_with_429() {
	let app = test_app_with(RateLimitConfig::new(60_000, 2), false);

	for _ in 0..2 {
		let res = app.router.clone().oneshot(request(Method::GET, "/health", addr(3))).await.unwrap();
		assert_eq!(res.status(), StatusCode::OK);
	}

	let res = app.router.clone().oneshot(request(Method::GET, "/health", addr(3))).await.unwrap();
	assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(res.headers().get("x-ratelimit-remaining").unwrap(), "0");
	assert!(res.headers().contains_key(header::RETRY_AFTER));

	let body = body_json(res).await;
	assert_eq!(body["error"], "Too Many Requests");
	assert_eq!(body["message"], "Rate limit exceeded. Please try again later.");
	let retry_after = body["retryAfter"].as_u64().unwrap();
	assert!(retry_after >= 1 && retry_after <= 60, "retryAfter {} out of range", retry_after);
}

#[tokio::test]
async fn clients_are_limited_independently() {
	let app = test_app_with(RateLimitConfig::new(60_000, 1), false);

	let res = app.router.clone().oneshot(request(Method::GET, "/health", addr(4))).await.unwrap();
	assert_eq!(res.status(), StatusCode::OK);
	let res = app.router.clone().oneshot(request(Method::GET, "/health", addr(4))).await.unwrap();
	assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

	// a different source address still has the full budget
	let res = app.router.clone().oneshot(request(Method::GET, "/health", addr(5))).await.unwrap();
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(res.headers().get("x-ratelimit-remaining").unwrap(), "0");
}

#[tokio::test]
async fn preflight_is_answered_before_the_rate_limiter() {
	let app = test_app_with(RateLimitConfig::new(60_000, 1), false);

	let mut req = Request::builder()
		.method(Method::OPTIONS)
		.uri("/health")
		.header(header::ORIGIN, "http://localhost:5173")
		.header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
		.body(Body::empty())
		.unwrap();
	req.extensions_mut().insert(ConnectInfo(addr(10)));

	let res = app.router.clone().oneshot(req).await.unwrap();
	assert_eq!(res.status(), StatusCode::OK);
	assert!(res.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
	// answered by the CORS layer, so no rate limit accounting
	assert!(!res.headers().contains_key("x-ratelimit-limit"));

	// the budget of max_requests = 1 is still intact
	let res = app.router.clone().oneshot(request(Method::GET, "/health", addr(10))).await.unwrap();
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(res.headers().get("x-ratelimit-remaining").unwrap(), "0");
}

#[tokio::test]
async fn unknown_route_gets_json_404() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(request(Method::GET, "/api/v1/nonexistent", addr(6)))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::NOT_FOUND);

	let body = body_json(res).await;
	assert_eq!(body["error"], "Not Found");
	assert_eq!(body["message"], "Route /api/v1/nonexistent not found");
	assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
	let app = test_app();

	let oversized = vec![b'a'; 10 * 1024 * 1024 + 1];
	let mut req = Request::builder()
		.method(Method::POST)
		.uri("/api/v1/reports")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(oversized))
		.unwrap();
	req.extensions_mut().insert(ConnectInfo(addr(7)));

	let res = app.router.clone().oneshot(req).await.unwrap();
	assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
	// nothing reached the handler
	assert!(app.meta.reports.lock().is_empty());
}

#[tokio::test]
async fn health_reports_database_connected() {
	let app = test_app();

	let res = app.router.clone().oneshot(request(Method::GET, "/health", addr(8))).await.unwrap();
	assert_eq!(res.status(), StatusCode::OK);

	let body = body_json(res).await;
	assert_eq!(body["status"], "healthy");
	assert_eq!(body["database"], "connected");
	assert!(body["timestamp"].is_string());
	assert!(body["version"].is_string());
}

#[tokio::test]
async fn error_responses_share_the_json_shape() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(json_request(
			Method::POST,
			"/api/v1/users/register",
			addr(9),
			&json!({ "username": " ", "email": "a@b.c", "password": "pw" }),
		))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);

	let body = body_json(res).await;
	assert_eq!(body["error"], "Bad Request");
	assert_eq!(body["message"], "Username, email, and password are required");
}

// vim: ts=4
