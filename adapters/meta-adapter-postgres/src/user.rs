//! User profile and admin user management queries

use sqlx::{postgres::PgRow, PgPool, QueryBuilder, Row};
use uuid::Uuid;

use kaji::meta_adapter::{AdminUser, ListUserOptions, UserStats};
use kaji::prelude::*;
use kaji::types::{Paginated, Role, User};

use crate::{collect_res, map_res, parse_col};

pub(crate) fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
	Ok(User {
		id: row.try_get("id")?,
		username: row.try_get::<String, _>("username")?.into(),
		email: row.try_get::<String, _>("email")?.into(),
		role: parse_col(row, "role")?,
		is_active: row.try_get("is_active")?,
		created_at: row.try_get("created_at")?,
		updated_at: row.try_get("updated_at")?,
	})
}

pub(crate) async fn read(db: &PgPool, id: Uuid) -> ApiResult<User> {
	let res = sqlx::query(
		"SELECT id, username, email, role, is_active, created_at, updated_at
		FROM users WHERE id = $1",
	)
	.bind(id)
	.fetch_one(db)
	.await;

	map_res(res, "User", user_from_row)
}

pub(crate) async fn update_email(db: &PgPool, id: Uuid, email: &str) -> ApiResult<User> {
	let taken = sqlx::query("SELECT id FROM users WHERE email = $1 AND id != $2")
		.bind(email)
		.bind(id)
		.fetch_optional(db)
		.await
		.inspect_err(crate::inspect)
		.map_err(|_| Error::DbError)?;
	if taken.is_some() {
		return Err(Error::conflict("Email already in use"));
	}

	let res = sqlx::query(
		"UPDATE users SET email = $1, updated_at = now() WHERE id = $2
		RETURNING id, username, email, role, is_active, created_at, updated_at",
	)
	.bind(email)
	.bind(id)
	.fetch_one(db)
	.await;

	map_res(res, "User", user_from_row)
}

pub(crate) async fn stats(db: &PgPool, id: Uuid) -> ApiResult<UserStats> {
	let res = sqlx::query(
		"SELECT
			(SELECT COUNT(*) FROM exploits WHERE created_by = $1) AS exploits_created,
			(SELECT COUNT(*) FROM user_reports WHERE user_id = $1) AS reports_submitted,
			(SELECT COUNT(*) FROM chat_sessions WHERE user_id = $1) AS chat_sessions,
			(SELECT COUNT(*) FROM user_reports WHERE user_id = $1 AND status = 'accepted') AS accepted_reports",
	)
	.bind(id)
	.fetch_one(db)
	.await;

	map_res(res, "User", |row| {
		Ok(UserStats {
			exploits_created: row.try_get("exploits_created")?,
			reports_submitted: row.try_get("reports_submitted")?,
			chat_sessions: row.try_get("chat_sessions")?,
			accepted_reports: row.try_get("accepted_reports")?,
		})
	})
}

pub(crate) async fn list(db: &PgPool, opts: &ListUserOptions) -> ApiResult<Paginated<AdminUser>> {
	let mut query = QueryBuilder::new(
		"SELECT
			u.id, u.username, u.email, u.role, u.is_active, u.created_at, u.updated_at,
			(SELECT COUNT(*) FROM exploits e WHERE e.created_by = u.id) AS exploits_created,
			(SELECT COUNT(*) FROM user_reports ur WHERE ur.user_id = u.id) AS reports_submitted
		FROM users u WHERE true",
	);
	let mut count = QueryBuilder::new("SELECT COUNT(*) AS total FROM users u WHERE true");

	if let Some(role) = opts.role {
		for q in [&mut query, &mut count] {
			q.push(" AND u.role = ").push_bind(role.as_str());
		}
	}
	if opts.active_only {
		for q in [&mut query, &mut count] {
			q.push(" AND u.is_active = true");
		}
	}

	query.push(" ORDER BY u.created_at DESC LIMIT ");
	query.push_bind(opts.limit);
	query.push(" OFFSET ");
	query.push_bind((opts.page.max(1) - 1) * opts.limit);

	let rows = query.build().fetch_all(db).await;
	let items = collect_res(rows, |row| {
		Ok(AdminUser {
			user: user_from_row(row)?,
			exploits_created: row.try_get("exploits_created")?,
			reports_submitted: row.try_get("reports_submitted")?,
		})
	})?;

	let total = count.build().fetch_one(db).await;
	let total: i64 = map_res(total, "User", |row| row.try_get("total"))?;

	Ok(Paginated::new(items, opts.page, opts.limit, total))
}

pub(crate) async fn update_role(db: &PgPool, id: Uuid, role: Role) -> ApiResult<User> {
	let res = sqlx::query(
		"UPDATE users SET role = $1, updated_at = now() WHERE id = $2
		RETURNING id, username, email, role, is_active, created_at, updated_at",
	)
	.bind(role.as_str())
	.bind(id)
	.fetch_one(db)
	.await;

	map_res(res, "User", user_from_row)
}

// vim: ts=4
