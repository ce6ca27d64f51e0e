//! Account queries and the credential flows

use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use kaji::auth_adapter::{AccessToken, AuthLogin};
use kaji::prelude::*;
use kaji::types::User;

use crate::{crypto, inspect, token};

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
	let role: String = row.try_get("role")?;
	Ok(User {
		id: row.try_get("id")?,
		username: row.try_get::<String, _>("username")?.into(),
		email: row.try_get::<String, _>("email")?.into(),
		role: role.parse().map_err(|_| sqlx::Error::ColumnDecode {
			index: "role".into(),
			source: format!("unexpected value {:?}", role).into(),
		})?,
		is_active: row.try_get("is_active")?,
		created_at: row.try_get("created_at")?,
		updated_at: row.try_get("updated_at")?,
	})
}

pub(crate) async fn create_user(
	db: &PgPool,
	username: &str,
	email: &str,
	password: &str,
) -> ApiResult<User> {
	let existing = sqlx::query("SELECT id FROM users WHERE username = $1 OR email = $2")
		.bind(username)
		.bind(email)
		.fetch_optional(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	if existing.is_some() {
		return Err(Error::conflict("Username or email already exists"));
	}

	let password_hash = crypto::generate_password_hash(password.into()).await?;

	let res = sqlx::query(
		"INSERT INTO users (username, email, password_hash)
		VALUES ($1, $2, $3)
		RETURNING id, username, email, role, is_active, created_at, updated_at",
	)
	.bind(username)
	.bind(email)
	.bind(password_hash.as_ref())
	.fetch_one(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	user_from_row(&res).map_err(|_| Error::DbError)
}

pub(crate) async fn check_password(
	db: &PgPool,
	jwt_secret: &str,
	username: &str,
	password: &str,
) -> ApiResult<AuthLogin> {
	let row = sqlx::query(
		"SELECT id, username, email, password_hash, role, is_active, created_at, updated_at
		FROM users WHERE username = $1 AND is_active = true",
	)
	.bind(username)
	.fetch_optional(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?
	// unknown user and wrong password look the same to the caller
	.ok_or(Error::Unauthorized)?;

	let password_hash: String = row.try_get("password_hash").map_err(|_| Error::DbError)?;
	crypto::check_password(password.into(), password_hash.into()).await?;

	let user = user_from_row(&row).map_err(|_| Error::DbError)?;
	let claims = AccessToken {
		sub: user.id,
		username: user.username.clone(),
		role: user.role,
		exp: token::expiry_timestamp(),
	};
	let token = token::generate_access_token(&claims, jwt_secret)?;

	Ok(AuthLogin { user, token })
}

pub(crate) async fn change_password(
	db: &PgPool,
	user_id: Uuid,
	current: &str,
	new: &str,
) -> ApiResult<()> {
	let row = sqlx::query("SELECT password_hash FROM users WHERE id = $1")
		.bind(user_id)
		.fetch_optional(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?
		.ok_or_else(|| Error::not_found("User not found"))?;

	let password_hash: String = row.try_get("password_hash").map_err(|_| Error::DbError)?;
	crypto::check_password(current.into(), password_hash.into()).await?;

	let new_hash = crypto::generate_password_hash(new.into()).await?;

	sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
		.bind(new_hash.as_ref())
		.bind(user_id)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	Ok(())
}

// vim: ts=4
