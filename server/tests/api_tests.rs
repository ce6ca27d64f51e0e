//! End-to-end API flows over the mock adapters

mod common;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower::ServiceExt;
use uuid::Uuid;

use kaji::meta_adapter::ChatMessage;
use kaji::types::ChatRole;

use common::{test_app, test_app_with, ADMIN_TOKEN, USER_TOKEN};
use kaji::core::rate_limit::RateLimitConfig;

fn client() -> SocketAddr {
	SocketAddr::from(([192, 168, 1, 10], 50000))
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder().method(Method::GET).uri(uri);
	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
	}
	let mut req = builder.body(Body::empty()).unwrap();
	req.extensions_mut().insert(ConnectInfo(client()));
	req
}

fn send_json(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
	let mut builder = Request::builder()
		.method(method)
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json");
	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
	}
	let mut req = builder.body(Body::from(body.to_string())).unwrap();
	req.extensions_mut().insert(ConnectInfo(client()));
	req
}

async fn body_json(res: axum::response::Response) -> Value {
	let bytes = res.into_body().collect().await.unwrap().to_bytes();
	serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn register_creates_user() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(send_json(
			Method::POST,
			"/api/v1/users/register",
			None,
			&json!({ "username": "link", "email": "link@example.com", "password": "ocarina" }),
		))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::CREATED);

	let body = body_json(res).await;
	assert_eq!(body["message"], "User registered successfully");
	assert_eq!(body["user"]["username"], "link");
	assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
	let app = test_app();
	let payload = json!({ "username": "link", "email": "link@example.com", "password": "ocarina" });

	let res = app
		.router
		.clone()
		.oneshot(send_json(Method::POST, "/api/v1/users/register", None, &payload))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::CREATED);

	let res = app
		.router
		.clone()
		.oneshot(send_json(Method::POST, "/api/v1/users/register", None, &payload))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::CONFLICT);
	assert_eq!(body_json(res).await["error"], "Conflict");
}

#[tokio::test]
async fn login_then_read_profile() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(send_json(
			Method::POST,
			"/api/v1/users/login",
			None,
			&json!({ "username": "zelda", "password": "hunter2" }),
		))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::OK);

	let body = body_json(res).await;
	let token = body["token"].as_str().unwrap().to_owned();
	assert_eq!(body["user"]["username"], "zelda");

	let res = app
		.router
		.clone()
		.oneshot(get("/api/v1/users/profile", Some(&token)))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(body_json(res).await["username"], "zelda");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(send_json(
			Method::POST,
			"/api/v1/users/login",
			None,
			&json!({ "username": "zelda", "password": "wrong" }),
		))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(body_json(res).await["error"], "Unauthorized");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
	let app = test_app();

	for req in [
		get("/api/v1/users/profile", None),
		get("/api/v1/users/profile", Some("garbage-token")),
		send_json(Method::POST, "/api/v1/exploits", None, &json!({})),
	] {
		let res = app.router.clone().oneshot(req).await.unwrap();
		assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
	}
}

#[tokio::test]
async fn admin_routes_reject_non_admins() {
	let app = test_app();

	let res = app.router.clone().oneshot(get("/api/v1/admin/stats", Some(USER_TOKEN))).await.unwrap();
	assert_eq!(res.status(), StatusCode::FORBIDDEN);
	assert_eq!(body_json(res).await["error"], "Forbidden");

	let res = app.router.clone().oneshot(get("/api/v1/admin/stats", Some(ADMIN_TOKEN))).await.unwrap();
	assert_eq!(res.status(), StatusCode::OK);
	let body = body_json(res).await;
	assert!(body["overview"]["total_users"].is_number());
}

#[tokio::test]
async fn report_is_created_even_when_triage_fails() {
	let app = test_app_with(RateLimitConfig::default(), true);

	let res = app
		.router
		.clone()
		.oneshot(send_json(
			Method::POST,
			"/api/v1/reports",
			None,
			&json!({
				"report_type": "suggestion",
				"title": "Add CVE links",
				"description": "Link each exploit to its CVE entry",
			}),
		))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::CREATED);

	let body = body_json(res).await;
	assert_eq!(body["status"], "pending");
	assert_eq!(body["title"], "Add CVE links");

	// the gateway failed, so no analysis was attached
	assert_eq!(app.meta.reports.lock().len(), 1);
	assert!(app.meta.analyses.lock().is_empty());
}

#[tokio::test]
async fn report_triage_stores_the_analysis() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(send_json(
			Method::POST,
			"/api/v1/reports",
			Some(USER_TOKEN),
			&json!({
				"report_type": "error",
				"title": "Wrong severity",
				"description": "CVE-2024-1234 should be critical",
			}),
		))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::CREATED);

	let analyses = app.meta.analyses.lock();
	assert_eq!(analyses.len(), 1);
	assert_eq!(analyses[0].1.as_ref(), "Looks plausible");
}

#[tokio::test]
async fn report_submission_validates_required_fields() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(send_json(
			Method::POST,
			"/api/v1/reports",
			None,
			&json!({ "report_type": "error", "title": "", "description": "x" }),
		))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
	assert!(app.meta.reports.lock().is_empty());
}

#[tokio::test]
async fn exploit_list_uses_the_pagination_envelope() {
	let app = test_app();

	let res = app.router.clone().oneshot(get("/api/v1/exploits?page=2&limit=5", None)).await.unwrap();
	assert_eq!(res.status(), StatusCode::OK);

	let body = body_json(res).await;
	assert!(body["items"].as_array().unwrap().is_empty());
	assert_eq!(body["pagination"]["page"], 2);
	assert_eq!(body["pagination"]["limit"], 5);
	assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn missing_resource_is_a_json_404() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(get("/api/v1/exploits/00000000-0000-0000-0000-000000000001", None))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::NOT_FOUND);

	let body = body_json(res).await;
	assert_eq!(body["error"], "Not Found");
	assert_eq!(body["message"], "Exploit not found");
}

#[tokio::test]
async fn chat_context_keeps_the_newest_messages() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(send_json(
			Method::POST,
			"/api/v1/chat/sessions",
			None,
			&json!({ "session_name": "long session" }),
		))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::CREATED);
	let session_id: Uuid = body_json(res).await["id"].as_str().unwrap().parse().unwrap();

	// a conversation longer than the context window
	{
		let mut messages = app.meta.messages.lock();
		for i in 1..=12 {
			messages.push(ChatMessage {
				id: Uuid::new_v4(),
				session_id,
				role: if i % 2 == 1 { ChatRole::User } else { ChatRole::Assistant },
				content: format!("m{}", i).into(),
				metadata: None,
				created_at: Utc::now() - Duration::seconds(120 - i),
			});
		}
	}

	let res = app
		.router
		.clone()
		.oneshot(send_json(
			Method::POST,
			&format!("/api/v1/chat/sessions/{}/messages", session_id),
			None,
			&json!({ "message": "m13" }),
		))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::OK);

	// the window is the tail of the conversation, oldest-first, ending with
	// the message just posted
	let contexts = app.ai.contexts.lock();
	assert_eq!(contexts.len(), 1);
	let conversation = contexts[0]["conversation"].as_array().unwrap();
	assert_eq!(conversation.len(), 10);
	assert_eq!(conversation[0]["content"], "m4");
	assert_eq!(conversation[8]["content"], "m12");
	assert_eq!(conversation[9]["content"], "m13");
}

#[tokio::test]
async fn admin_user_list_accepts_pagination_params() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(get("/api/v1/admin/users?page=1&limit=10&active_only=true", Some(ADMIN_TOKEN)))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::OK);

	let body = body_json(res).await;
	assert_eq!(body["pagination"]["page"], 1);
	assert_eq!(body["pagination"]["limit"], 10);
}

#[tokio::test]
async fn chat_suggestions_filter_by_query() {
	let app = test_app();

	let res = app
		.router
		.clone()
		.oneshot(send_json(
			Method::POST,
			"/api/v1/chat/suggestions",
			None,
			&json!({ "query": "update" }),
		))
		.await
		.unwrap();
	assert_eq!(res.status(), StatusCode::OK);

	let body = body_json(res).await;
	let suggestions = body["suggestions"].as_array().unwrap();
	assert!(!suggestions.is_empty());
	assert!(suggestions.len() <= 5);
	for s in suggestions {
		assert!(s.as_str().unwrap().to_lowercase().contains("update"));
	}
}

// vim: ts=4
