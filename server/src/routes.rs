//! Router assembly and the fixed middleware pipeline
//!
//! Layer order is a contract: security headers, then CORS, then rate
//! limiting, then the body size cap, then request tracing. CORS preflights
//! are answered by the CORS layer and never reach the limiter; over-limit
//! requests are refused before any body is buffered.

use axum::{
	extract::{DefaultBodyLimit, State},
	http::{header, HeaderValue, Method, StatusCode, Uri},
	middleware,
	response::IntoResponse,
	routing::{delete, get, patch, post, put},
	Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
	cors::CorsLayer,
	limit::RequestBodyLimitLayer,
	set_header::SetResponseHeaderLayer,
	trace::TraceLayer,
};

use crate::core::middleware::{optional_auth, require_admin, require_auth, require_researcher};
use crate::core::rate_limit::RateLimitLayer;
use crate::prelude::*;
use crate::types::VERSION;
use crate::{admin, auth, chat, exploit, report, version};

/// Request bodies above this size are refused with 413
const BODY_LIMIT: usize = 10 * 1024 * 1024;

fn users_router(app: App) -> Router<App> {
	let protected = Router::new()
		.route("/profile", get(auth::handler::get_profile).put(auth::handler::put_profile))
		.route("/change-password", put(auth::handler::put_change_password))
		.route("/stats", get(auth::handler::get_stats))
		.route_layer(middleware::from_fn_with_state(app, require_auth));

	Router::new()
		.route("/register", post(auth::handler::post_register))
		.route("/login", post(auth::handler::post_login))
		.merge(protected)
}

fn versions_router(app: App) -> Router<App> {
	let public = Router::new()
		.route("/", get(version::handler::get_versions))
		.route("/stats/overview", get(version::handler::get_stats))
		.route("/{id}", get(version::handler::get_version))
		.route("/{id}/exploits", get(version::handler::get_version_exploits));

	let researcher = Router::new()
		.route("/", post(version::handler::post_version))
		.route("/{id}", put(version::handler::put_version))
		.route_layer(middleware::from_fn_with_state(app.clone(), require_researcher));

	let admin_only = Router::new()
		.route("/{id}/set-current", patch(version::handler::patch_set_current))
		.route_layer(middleware::from_fn_with_state(app, require_admin));

	public.merge(researcher).merge(admin_only)
}

fn exploits_router(app: App) -> Router<App> {
	let public = Router::new()
		.route("/", get(exploit::handler::get_exploits))
		.route("/{id}", get(exploit::handler::get_exploit))
		.route_layer(middleware::from_fn_with_state(app.clone(), optional_auth));

	let protected = Router::new()
		.route("/", post(exploit::handler::post_exploit))
		.route("/{id}", put(exploit::handler::put_exploit))
		.route_layer(middleware::from_fn_with_state(app.clone(), require_auth));

	let admin_only = Router::new()
		.route("/{id}", delete(exploit::handler::delete_exploit))
		.route_layer(middleware::from_fn_with_state(app, require_admin));

	public.merge(protected).merge(admin_only)
}

fn reports_router(app: App) -> Router<App> {
	let public = Router::new()
		.route("/", post(report::handler::post_report).get(report::handler::get_reports))
		.route("/stats/overview", get(report::handler::get_stats))
		.route("/{id}", get(report::handler::get_report))
		.route_layer(middleware::from_fn_with_state(app.clone(), optional_auth));

	let admin_only = Router::new()
		.route("/{id}/status", patch(report::handler::patch_status))
		.route_layer(middleware::from_fn_with_state(app, require_admin));

	public.merge(admin_only)
}

fn chat_router(app: App) -> Router<App> {
	Router::new()
		.route("/sessions", post(chat::handler::post_session).get(chat::handler::get_sessions))
		.route(
			"/sessions/{id}/messages",
			get(chat::handler::get_messages).post(chat::handler::post_message),
		)
		.route("/sessions/{id}", delete(chat::handler::delete_session))
		.route("/suggestions", post(chat::handler::post_suggestions))
		.route_layer(middleware::from_fn_with_state(app, optional_auth))
}

fn admin_router(app: App) -> Router<App> {
	Router::new()
		.route("/stats", get(admin::handler::get_stats))
		.route("/logs", get(admin::handler::get_logs))
		.route("/scan/{version_id}", post(admin::handler::post_scan))
		.route("/config", put(admin::handler::put_config))
		.route("/ai-training", get(admin::handler::get_training_data))
		.route("/ai-training/{id}/validate", patch(admin::handler::patch_training_validate))
		.route("/users", get(admin::handler::get_users))
		.route("/users/{id}/role", patch(admin::handler::patch_user_role))
		.route_layer(middleware::from_fn_with_state(app, require_admin))
}

/// # GET /health
async fn get_health(State(app): State<App>) -> axum::response::Response {
	match app.meta_adapter.check().await {
		Ok(()) => Json(json!({
			"status": "healthy",
			"timestamp": Utc::now().to_rfc3339(),
			"database": "connected",
			"version": VERSION,
		}))
		.into_response(),
		Err(err) => {
			error!("Health check failed: {}", err);
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(json!({
					"status": "unhealthy",
					"timestamp": Utc::now().to_rfc3339(),
					"error": err.to_string(),
				})),
			)
				.into_response()
		}
	}
}

/// # GET /api/v1/docs
async fn get_docs() -> Json<serde_json::Value> {
	Json(json!({
		"name": "Kaji Security Research API",
		"version": VERSION,
		"description": "AI-powered vulnerability research and analysis",
		"endpoints": {
			"exploits": "/api/v1/exploits",
			"users": "/api/v1/users",
			"reports": "/api/v1/reports",
			"chat": "/api/v1/chat",
			"admin": "/api/v1/admin",
			"versions": "/api/v1/versions",
		},
	}))
}

async fn fallback(uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
	(
		StatusCode::NOT_FOUND,
		Json(json!({
			"error": "Not Found",
			"message": format!("Route {} not found", uri.path()),
			"timestamp": Utc::now().to_rfc3339(),
		})),
	)
}

fn cors_layer(origin: &str) -> CorsLayer {
	let layer = CorsLayer::new()
		.allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
		.allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
		.allow_credentials(true);

	match origin.parse::<HeaderValue>() {
		Ok(origin) => layer.allow_origin(origin),
		Err(_) => {
			warn!("Invalid CORS origin, allowing none");
			layer
		}
	}
}

pub fn init(app: App) -> Router {
	let api = Router::new()
		.route("/docs", get(get_docs))
		.nest("/users", users_router(app.clone()))
		.nest("/versions", versions_router(app.clone()))
		.nest("/exploits", exploits_router(app.clone()))
		.nest("/reports", reports_router(app.clone()))
		.nest("/chat", chat_router(app.clone()))
		.nest("/admin", admin_router(app.clone()));

	// Each `Router::layer` call wraps everything added before it, so the
	// last call is outermost. The rate limit layer is applied on its own so
	// it sees the router's uniform response body type.
	Router::new()
		.route("/health", get(get_health))
		.nest("/api/v1", api)
		.fallback(fallback)
		.layer(
			ServiceBuilder::new()
				.layer(DefaultBodyLimit::disable())
				.layer(RequestBodyLimitLayer::new(BODY_LIMIT))
				.layer(TraceLayer::new_for_http()),
		)
		.layer(RateLimitLayer::new(app.rate_limiter.clone()))
		.layer(cors_layer(&app.opts.cors_origin))
		.layer(
			ServiceBuilder::new()
				.layer(SetResponseHeaderLayer::if_not_present(
					header::X_CONTENT_TYPE_OPTIONS,
					HeaderValue::from_static("nosniff"),
				))
				.layer(SetResponseHeaderLayer::if_not_present(
					header::X_FRAME_OPTIONS,
					HeaderValue::from_static("SAMEORIGIN"),
				))
				.layer(SetResponseHeaderLayer::if_not_present(
					header::REFERRER_POLICY,
					HeaderValue::from_static("no-referrer"),
				)),
		)
		.with_state(app)
}

// vim: ts=4
