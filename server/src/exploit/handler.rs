//! Exploit catalogue endpoints
//!
//! Listing is public but anonymous callers only see public entries.
//! Mutation requires authentication; updates are restricted to the creator
//! or an admin, deletion to admins.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::core::{Auth, OptionalAuth};
use crate::meta_adapter::{CreateExploit, Exploit, ListExploitOptions, UpdateExploit};
use crate::prelude::*;
use crate::types::{Paginated, Severity};

/// # GET /api/v1/exploits
#[derive(Deserialize)]
pub struct ListExploitsQuery {
	#[serde(default = "crate::types::default_page")]
	page: i64,
	#[serde(default = "crate::types::default_limit")]
	limit: i64,
	severity: Option<Severity>,
	os_version_id: Option<Uuid>,
	category_id: Option<Uuid>,
	search: Option<Box<str>>,
}

pub async fn get_exploits(
	State(app): State<App>,
	OptionalAuth(auth): OptionalAuth,
	Query(query): Query<ListExploitsQuery>,
) -> ApiResult<Json<Paginated<Exploit>>> {
	let opts = ListExploitOptions {
		page: query.page,
		limit: query.limit,
		severity: query.severity,
		os_version_id: query.os_version_id,
		category_id: query.category_id,
		search: query.search,
		include_private: auth.is_some(),
	};
	let exploits = app.meta_adapter.list_exploits(&opts).await?;
	Ok(Json(exploits))
}

/// # GET /api/v1/exploits/{id}
pub async fn get_exploit(
	State(app): State<App>,
	OptionalAuth(auth): OptionalAuth,
	Path(id): Path<Uuid>,
) -> ApiResult<Json<Exploit>> {
	let exploit = app.meta_adapter.read_exploit(id).await?;

	if !exploit.is_public && auth.is_none() {
		return Err(Error::not_found("Exploit not found"));
	}

	Ok(Json(exploit))
}

/// # POST /api/v1/exploits
pub async fn post_exploit(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(data): Json<CreateExploit>,
) -> ApiResult<(StatusCode, Json<Exploit>)> {
	if data.title.trim().is_empty() || data.description.trim().is_empty() {
		return Err(Error::validation("Title, description, severity, and OS version are required"));
	}

	let exploit = app.meta_adapter.create_exploit(auth.user_id, &data).await?;

	info!(exploit_id = %exploit.id, title = %exploit.title, user_id = %auth.user_id, "New exploit created");

	Ok((StatusCode::CREATED, Json(exploit)))
}

/// # PUT /api/v1/exploits/{id}
pub async fn put_exploit(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(id): Path<Uuid>,
	Json(data): Json<UpdateExploit>,
) -> ApiResult<Json<Exploit>> {
	let existing = app.meta_adapter.read_exploit(id).await?;

	if existing.created_by != Some(auth.user_id) && !auth.role.is_admin() {
		return Err(Error::PermissionDenied);
	}

	let exploit = app.meta_adapter.update_exploit(id, &data).await?;

	info!(exploit_id = %id, user_id = %auth.user_id, "Exploit updated");

	Ok(Json(exploit))
}

/// # DELETE /api/v1/exploits/{id}
pub async fn delete_exploit(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
	app.meta_adapter.delete_exploit(id).await?;

	info!(exploit_id = %id, user_id = %auth.user_id, "Exploit deleted");

	Ok(Json(json!({ "message": "Exploit deleted successfully" })))
}

// vim: ts=4
