//! User account endpoints: registration, login, profile, password

use axum::{
	extract::State,
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::Auth;
use crate::meta_adapter::UserStats;
use crate::prelude::*;
use crate::types::User;

/// # POST /api/v1/users/register
#[derive(Deserialize)]
pub struct RegisterReq {
	username: Box<str>,
	email: Box<str>,
	password: Box<str>,
}

#[derive(Serialize)]
pub struct RegisterRes {
	user: User,
	message: Box<str>,
}

pub async fn post_register(
	State(app): State<App>,
	Json(req): Json<RegisterReq>,
) -> ApiResult<(StatusCode, Json<RegisterRes>)> {
	if req.username.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
		return Err(Error::validation("Username, email, and password are required"));
	}

	let user = app.auth_adapter.create_user(&req.username, &req.email, &req.password).await?;

	info!(user_id = %user.id, username = %user.username, "New user registered");

	Ok((
		StatusCode::CREATED,
		Json(RegisterRes { user, message: "User registered successfully".into() }),
	))
}

/// # POST /api/v1/users/login
#[derive(Deserialize)]
pub struct LoginReq {
	username: Box<str>,
	password: Box<str>,
}

#[derive(Serialize)]
pub struct LoginRes {
	token: Box<str>,
	user: User,
}

pub async fn post_login(
	State(app): State<App>,
	Json(req): Json<LoginReq>,
) -> ApiResult<Json<LoginRes>> {
	if req.username.is_empty() || req.password.is_empty() {
		return Err(Error::validation("Username and password are required"));
	}

	let login = app.auth_adapter.check_password(&req.username, &req.password).await?;

	info!(user_id = %login.user.id, username = %login.user.username, "User logged in");

	Ok(Json(LoginRes { token: login.token, user: login.user }))
}

/// # GET /api/v1/users/profile
pub async fn get_profile(State(app): State<App>, Auth(auth): Auth) -> ApiResult<Json<User>> {
	let user = app.meta_adapter.read_user(auth.user_id).await?;
	Ok(Json(user))
}

/// # PUT /api/v1/users/profile
#[derive(Deserialize)]
pub struct UpdateProfileReq {
	email: Option<Box<str>>,
}

pub async fn put_profile(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(req): Json<UpdateProfileReq>,
) -> ApiResult<Json<User>> {
	let email = match req.email.as_deref().map(str::trim) {
		Some(email) if !email.is_empty() => email,
		_ => return Err(Error::validation("No fields to update")),
	};

	let user = app.meta_adapter.update_user_email(auth.user_id, email).await?;

	info!(user_id = %auth.user_id, "User profile updated");

	Ok(Json(user))
}

/// # PUT /api/v1/users/change-password
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordReq {
	current_password: Box<str>,
	new_password: Box<str>,
}

pub async fn put_change_password(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(req): Json<ChangePasswordReq>,
) -> ApiResult<Json<serde_json::Value>> {
	if req.current_password.is_empty() || req.new_password.is_empty() {
		return Err(Error::validation("Current password and new password are required"));
	}

	app.auth_adapter
		.change_password(auth.user_id, &req.current_password, &req.new_password)
		.await?;

	info!(user_id = %auth.user_id, "User password changed");

	Ok(Json(json!({ "message": "Password changed successfully" })))
}

/// # GET /api/v1/users/stats
pub async fn get_stats(State(app): State<App>, Auth(auth): Auth) -> ApiResult<Json<UserStats>> {
	let stats = app.meta_adapter.read_user_stats(auth.user_id).await?;
	Ok(Json(stats))
}

// vim: ts=4
