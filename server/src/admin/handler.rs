//! Admin endpoints, all behind the admin middleware layer

use axum::{
	extract::{Path, Query, State},
	Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::core::Auth;
use crate::meta_adapter::{
	ActivityItem, AdminOverview, AdminUser, ListExploitOptions, ListLogOptions, ListUserOptions,
	SystemLog, TrainingData,
};
use crate::prelude::*;
use crate::types::{Paginated, Role, User};

/// # GET /api/v1/admin/stats
#[derive(Serialize)]
pub struct AdminStatsRes {
	overview: AdminOverview,
	recent_activity: Vec<ActivityItem>,
}

pub async fn get_stats(State(app): State<App>) -> ApiResult<Json<AdminStatsRes>> {
	let (overview, recent_activity) = app.meta_adapter.admin_stats().await?;
	Ok(Json(AdminStatsRes { overview, recent_activity }))
}

/// # GET /api/v1/admin/logs
#[derive(Deserialize)]
pub struct ListLogsQuery {
	#[serde(default = "default_log_page")]
	page: i64,
	#[serde(default = "default_log_limit")]
	limit: i64,
	level: Option<Box<str>>,
}

fn default_log_page() -> i64 {
	1
}

fn default_log_limit() -> i64 {
	50
}

pub async fn get_logs(
	State(app): State<App>,
	Query(query): Query<ListLogsQuery>,
) -> ApiResult<Json<Paginated<SystemLog>>> {
	let opts = ListLogOptions { page: query.page, limit: query.limit, level: query.level };
	let logs = app.meta_adapter.list_logs(&opts).await?;
	Ok(Json(logs))
}

/// # POST /api/v1/admin/scan/{version_id}
#[derive(Serialize)]
pub struct ScanRes {
	version_id: Uuid,
	version: Box<str>,
	vulnerabilities_found: usize,
	vulnerabilities: Vec<Box<str>>,
	scan_date: DateTime<Utc>,
}

pub async fn post_scan(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(version_id): Path<Uuid>,
) -> ApiResult<Json<ScanRes>> {
	let version = app.meta_adapter.read_version(version_id).await?;

	let existing = app
		.meta_adapter
		.list_exploits(&ListExploitOptions {
			page: 1,
			limit: 500,
			os_version_id: Some(version_id),
			include_private: false,
			..Default::default()
		})
		.await?;
	let existing: Vec<Box<str>> = existing
		.items
		.iter()
		.map(|e| format!("{}: {}", e.title, e.description).into_boxed_str())
		.collect();

	let vulnerabilities = app
		.ai_adapter
		.find_new_vulnerabilities(&version.version.version, &existing)
		.await?;

	let scan_date = Utc::now();
	let context = json!({
		"version_id": version_id,
		"version": version.version.version,
		"vulnerabilities_found": vulnerabilities.len(),
		"vulnerabilities": vulnerabilities,
		"scan_date": scan_date.to_rfc3339(),
	});
	app.meta_adapter
		.write_log("info", "AI vulnerability scan completed", Some(&context))
		.await?;

	info!(
		version_id = %version_id,
		version = %version.version.version,
		vulnerabilities_found = vulnerabilities.len(),
		admin_id = %auth.user_id,
		"AI vulnerability scan completed"
	);

	Ok(Json(ScanRes {
		version_id,
		version: version.version.version,
		vulnerabilities_found: vulnerabilities.len(),
		vulnerabilities,
		scan_date,
	}))
}

/// # PUT /api/v1/admin/config
///
/// Audited key/value write: the change is recorded to the system log rather
/// than a dedicated config table.
#[derive(Deserialize)]
pub struct ConfigReq {
	key: Option<Box<str>>,
	value: Option<serde_json::Value>,
}

pub async fn put_config(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(req): Json<ConfigReq>,
) -> ApiResult<Json<serde_json::Value>> {
	let (Some(key), Some(value)) = (req.key, req.value) else {
		return Err(Error::validation("Configuration key and value are required"));
	};

	let context = json!({
		"config_key": key,
		"config_value": value,
		"updated_by": auth.user_id,
		"updated_at": Utc::now().to_rfc3339(),
	});
	app.meta_adapter
		.write_log("info", "System configuration updated", Some(&context))
		.await?;

	info!(key = %key, updated_by = %auth.user_id, "System configuration updated");

	Ok(Json(json!({
		"message": "Configuration updated successfully",
		"key": key,
		"value": value,
	})))
}

/// # GET /api/v1/admin/ai-training
#[derive(Deserialize)]
pub struct ListTrainingQuery {
	#[serde(default = "crate::types::default_page")]
	page: i64,
	#[serde(default = "crate::types::default_limit")]
	limit: i64,
	#[serde(default)]
	validated_only: bool,
}

pub async fn get_training_data(
	State(app): State<App>,
	Query(query): Query<ListTrainingQuery>,
) -> ApiResult<Json<Paginated<TrainingData>>> {
	let data = app
		.meta_adapter
		.list_training_data(query.page, query.limit, query.validated_only)
		.await?;
	Ok(Json(data))
}

/// # PATCH /api/v1/admin/ai-training/{id}/validate
#[derive(Deserialize)]
pub struct ValidateTrainingReq {
	#[serde(default = "default_true")]
	is_validated: bool,
}

fn default_true() -> bool {
	true
}

pub async fn patch_training_validate(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(id): Path<Uuid>,
	Json(req): Json<ValidateTrainingReq>,
) -> ApiResult<Json<TrainingData>> {
	let data = app.meta_adapter.set_training_validated(id, req.is_validated).await?;

	info!(
		training_data_id = %id,
		is_validated = req.is_validated,
		updated_by = %auth.user_id,
		"AI training data validation updated"
	);

	Ok(Json(data))
}

/// # GET /api/v1/admin/users
#[derive(Deserialize)]
pub struct ListUsersQuery {
	#[serde(default = "crate::types::default_page")]
	page: i64,
	#[serde(default = "crate::types::default_limit")]
	limit: i64,
	role: Option<Role>,
	#[serde(default = "default_true")]
	active_only: bool,
}

pub async fn get_users(
	State(app): State<App>,
	Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Paginated<AdminUser>>> {
	let opts = ListUserOptions {
		page: query.page,
		limit: query.limit,
		role: query.role,
		active_only: query.active_only,
	};
	let users = app.meta_adapter.list_users(&opts).await?;
	Ok(Json(users))
}

/// # PATCH /api/v1/admin/users/{id}/role
#[derive(Deserialize)]
pub struct UpdateRoleReq {
	role: Role,
}

pub async fn patch_user_role(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(id): Path<Uuid>,
	Json(req): Json<UpdateRoleReq>,
) -> ApiResult<Json<User>> {
	let user = app.meta_adapter.update_user_role(id, req.role).await?;

	info!(user_id = %id, new_role = req.role.as_str(), updated_by = %auth.user_id, "User role updated");

	Ok(Json(user))
}

// vim: ts=4
