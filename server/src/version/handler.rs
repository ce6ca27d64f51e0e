//! OS version catalogue endpoints

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::core::Auth;
use crate::meta_adapter::{
	CreateVersion, Exploit, ListExploitOptions, OsVersion, UpdateVersion, VersionDistribution,
	VersionOverview, VersionWithCounts,
};
use crate::prelude::*;
use crate::types::{Paginated, Severity};

/// # GET /api/v1/versions
#[derive(Deserialize)]
pub struct ListVersionsQuery {
	#[serde(default)]
	current_only: bool,
}

pub async fn get_versions(
	State(app): State<App>,
	Query(query): Query<ListVersionsQuery>,
) -> ApiResult<Json<Vec<VersionWithCounts>>> {
	let versions = app.meta_adapter.list_versions(query.current_only).await?;
	Ok(Json(versions))
}

/// # GET /api/v1/versions/{id}
pub async fn get_version(
	State(app): State<App>,
	Path(id): Path<Uuid>,
) -> ApiResult<Json<VersionWithCounts>> {
	let version = app.meta_adapter.read_version(id).await?;
	Ok(Json(version))
}

/// # GET /api/v1/versions/{id}/exploits
#[derive(Deserialize)]
pub struct VersionExploitsQuery {
	#[serde(default = "crate::types::default_page")]
	page: i64,
	#[serde(default = "crate::types::default_limit")]
	limit: i64,
	severity: Option<Severity>,
}

pub async fn get_version_exploits(
	State(app): State<App>,
	Path(id): Path<Uuid>,
	Query(query): Query<VersionExploitsQuery>,
) -> ApiResult<Json<Paginated<Exploit>>> {
	// public exploits only, no matter who asks: this is the catalogue view
	let opts = ListExploitOptions {
		page: query.page,
		limit: query.limit,
		severity: query.severity,
		os_version_id: Some(id),
		include_private: false,
		..Default::default()
	};
	let exploits = app.meta_adapter.list_exploits(&opts).await?;
	Ok(Json(exploits))
}

/// # POST /api/v1/versions
pub async fn post_version(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(data): Json<CreateVersion>,
) -> ApiResult<(StatusCode, Json<OsVersion>)> {
	if data.version.trim().is_empty() {
		return Err(Error::validation("Version is required"));
	}

	let version = app.meta_adapter.create_version(&data).await?;

	info!(version_id = %version.id, version = %version.version, user_id = %auth.user_id, "New OS version created");

	Ok((StatusCode::CREATED, Json(version)))
}

/// # PUT /api/v1/versions/{id}
pub async fn put_version(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(id): Path<Uuid>,
	Json(data): Json<UpdateVersion>,
) -> ApiResult<Json<OsVersion>> {
	if data.is_empty() {
		return Err(Error::validation("No fields to update"));
	}

	let version = app.meta_adapter.update_version(id, &data).await?;

	info!(version_id = %id, user_id = %auth.user_id, "OS version updated");

	Ok(Json(version))
}

/// # PATCH /api/v1/versions/{id}/set-current
pub async fn patch_set_current(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
	app.meta_adapter.set_current_version(id).await?;

	info!(version_id = %id, updated_by = %auth.user_id, "Current OS version updated");

	Ok(Json(json!({ "message": "Current OS version updated successfully" })))
}

/// # GET /api/v1/versions/stats/overview
#[derive(Serialize)]
pub struct VersionStatsRes {
	overview: VersionOverview,
	version_distribution: Vec<VersionDistribution>,
}

pub async fn get_stats(State(app): State<App>) -> ApiResult<Json<VersionStatsRes>> {
	let (overview, version_distribution) = app.meta_adapter.version_stats().await?;
	Ok(Json(VersionStatsRes { overview, version_distribution }))
}

// vim: ts=4
