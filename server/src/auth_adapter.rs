//! Credential and token management adapter interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::types::{Role, User};

/// JWT claims carried by an access token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessToken {
	pub sub: Uuid,
	pub username: Box<str>,
	pub role: Role,
	pub exp: u64,
}

/// Authenticated request context, derived from a validated token
#[derive(Clone, Debug)]
pub struct AuthCtx {
	pub user_id: Uuid,
	pub username: Box<str>,
	pub role: Role,
}

/// Successful login result: the user row plus a freshly issued token
#[derive(Clone, Debug)]
pub struct AuthLogin {
	pub user: User,
	pub token: Box<str>,
}

#[async_trait]
pub trait AuthAdapter: Send + Sync + Debug {
	/// Create a user with a hashed password. Fails with `Error::Conflict`
	/// when the username or email is already taken.
	async fn create_user(&self, username: &str, email: &str, password: &str) -> ApiResult<User>;

	/// Verify credentials and issue an access token. Unknown user and wrong
	/// password are indistinguishable to the caller (`Error::Unauthorized`).
	async fn check_password(&self, username: &str, password: &str) -> ApiResult<AuthLogin>;

	/// Change a user's password after verifying the current one
	async fn change_password(&self, user_id: Uuid, current: &str, new: &str) -> ApiResult<()>;

	/// Validate an access token and return the request context
	async fn validate_token(&self, token: &str) -> ApiResult<AuthCtx>;
}

// vim: ts=4
