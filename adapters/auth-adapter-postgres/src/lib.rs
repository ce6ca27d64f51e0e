//! PostgreSQL authentication adapter
//!
//! Accounts live in the same `users` table the metadata adapter reads;
//! this crate owns the credential paths (bcrypt hashes, JWT issue/verify)
//! so password material never crosses the adapter boundary.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

use kaji::{
	auth_adapter::{AuthAdapter, AuthCtx, AuthLogin},
	prelude::*,
	types::User,
};

mod auth;
mod crypto;
mod token;

pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

#[derive(Debug)]
pub struct AuthAdapterPostgres {
	db: PgPool,
	jwt_secret: Box<str>,
}

impl AuthAdapterPostgres {
	pub async fn new(database_url: &str, jwt_secret: impl Into<Box<str>>) -> ApiResult<Self> {
		let db = PgPoolOptions::new()
			.max_connections(20)
			.acquire_timeout(Duration::from_secs(2))
			.idle_timeout(Duration::from_secs(30))
			.connect(database_url)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;

		// shared with the metadata adapter, idempotent on purpose
		sqlx::query(
			"CREATE TABLE IF NOT EXISTS users (
			id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
			username text NOT NULL UNIQUE,
			email text NOT NULL UNIQUE,
			password_hash text NOT NULL,
			role text NOT NULL DEFAULT 'user',
			is_active boolean NOT NULL DEFAULT true,
			created_at timestamptz NOT NULL DEFAULT now(),
			updated_at timestamptz NOT NULL DEFAULT now()
		)",
		)
		.execute(&db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

		Ok(Self { db, jwt_secret: jwt_secret.into() })
	}
}

#[async_trait]
impl AuthAdapter for AuthAdapterPostgres {
	async fn create_user(&self, username: &str, email: &str, password: &str) -> ApiResult<User> {
		auth::create_user(&self.db, username, email, password).await
	}

	async fn check_password(&self, username: &str, password: &str) -> ApiResult<AuthLogin> {
		auth::check_password(&self.db, &self.jwt_secret, username, password).await
	}

	async fn change_password(&self, user_id: Uuid, current: &str, new: &str) -> ApiResult<()> {
		auth::change_password(&self.db, user_id, current, new).await
	}

	async fn validate_token(&self, token: &str) -> ApiResult<AuthCtx> {
		let claims = token::validate_access_token(token, &self.jwt_secret)?;
		Ok(AuthCtx { user_id: claims.sub, username: claims.username, role: claims.role })
	}
}

// vim: ts=4
