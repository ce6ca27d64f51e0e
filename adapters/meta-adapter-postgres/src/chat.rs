//! Chat session and message queries

use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use kaji::meta_adapter::{ChatMessage, ChatSession, ChatSessionSummary};
use kaji::prelude::*;
use kaji::types::ChatRole;

use crate::{collect_res, inspect, map_res, opt_box, parse_col};

fn session_from_row(row: &PgRow) -> Result<ChatSession, sqlx::Error> {
	Ok(ChatSession {
		id: row.try_get("id")?,
		user_id: row.try_get("user_id")?,
		session_name: opt_box(row.try_get("session_name")?),
		created_at: row.try_get("created_at")?,
		updated_at: row.try_get("updated_at")?,
	})
}

fn message_from_row(row: &PgRow) -> Result<ChatMessage, sqlx::Error> {
	Ok(ChatMessage {
		id: row.try_get("id")?,
		session_id: row.try_get("session_id")?,
		role: parse_col(row, "role")?,
		content: row.try_get::<String, _>("content")?.into(),
		metadata: row.try_get("metadata")?,
		created_at: row.try_get("created_at")?,
	})
}

pub(crate) async fn create_session(
	db: &PgPool,
	user_id: Option<Uuid>,
	session_name: Option<&str>,
) -> ApiResult<ChatSession> {
	let res = sqlx::query(
		"INSERT INTO chat_sessions (user_id, session_name) VALUES ($1, $2) RETURNING *",
	)
	.bind(user_id)
	.bind(session_name)
	.fetch_one(db)
	.await;

	map_res(res, "Chat session", session_from_row)
}

/// The caller's sessions plus anonymous ones, most recently active first
pub(crate) async fn list_sessions(
	db: &PgPool,
	user_id: Option<Uuid>,
) -> ApiResult<Vec<ChatSessionSummary>> {
	let rows = sqlx::query(
		"SELECT s.*,
			COUNT(m.id) AS message_count,
			MAX(m.created_at) AS last_message_at
		FROM chat_sessions s
		LEFT JOIN chat_messages m ON s.id = m.session_id
		WHERE s.user_id = $1 OR s.user_id IS NULL
		GROUP BY s.id
		ORDER BY s.updated_at DESC",
	)
	.bind(user_id)
	.fetch_all(db)
	.await;

	collect_res(rows, |row| {
		Ok(ChatSessionSummary {
			session: session_from_row(row)?,
			message_count: row.try_get("message_count")?,
			last_message_at: row.try_get("last_message_at")?,
		})
	})
}

pub(crate) async fn read_session(db: &PgPool, id: Uuid) -> ApiResult<ChatSession> {
	let res = sqlx::query("SELECT * FROM chat_sessions WHERE id = $1").bind(id).fetch_one(db).await;

	map_res(res, "Chat session", session_from_row)
}

pub(crate) async fn list_messages(
	db: &PgPool,
	session_id: Uuid,
	limit: i64,
	offset: i64,
) -> ApiResult<Vec<ChatMessage>> {
	let rows = sqlx::query(
		"SELECT * FROM chat_messages
		WHERE session_id = $1
		ORDER BY created_at ASC
		LIMIT $2 OFFSET $3",
	)
	.bind(session_id)
	.bind(limit)
	.bind(offset)
	.fetch_all(db)
	.await;

	collect_res(rows, message_from_row)
}

/// The newest `limit` messages, newest first
pub(crate) async fn list_recent_messages(
	db: &PgPool,
	session_id: Uuid,
	limit: i64,
) -> ApiResult<Vec<ChatMessage>> {
	let rows = sqlx::query(
		"SELECT * FROM chat_messages
		WHERE session_id = $1
		ORDER BY created_at DESC
		LIMIT $2",
	)
	.bind(session_id)
	.bind(limit)
	.fetch_all(db)
	.await;

	collect_res(rows, message_from_row)
}

pub(crate) async fn create_message(
	db: &PgPool,
	session_id: Uuid,
	role: ChatRole,
	content: &str,
	metadata: Option<&Value>,
) -> ApiResult<ChatMessage> {
	let res = sqlx::query(
		"INSERT INTO chat_messages (session_id, role, content, metadata)
		VALUES ($1, $2, $3, $4)
		RETURNING *",
	)
	.bind(session_id)
	.bind(role.as_str())
	.bind(content)
	.bind(metadata)
	.fetch_one(db)
	.await;

	map_res(res, "Chat session", message_from_row)
}

pub(crate) async fn touch_session(db: &PgPool, id: Uuid) -> ApiResult<()> {
	sqlx::query("UPDATE chat_sessions SET updated_at = now() WHERE id = $1")
		.bind(id)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	Ok(())
}

pub(crate) async fn delete_session(db: &PgPool, id: Uuid, user_id: Option<Uuid>) -> ApiResult<()> {
	// ownership check and delete in one statement; messages cascade
	let deleted = sqlx::query("DELETE FROM chat_sessions WHERE id = $1 AND user_id IS NOT DISTINCT FROM $2")
		.bind(id)
		.bind(user_id)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	if deleted.rows_affected() == 0 {
		return Err(Error::not_found("Chat session not found or access denied"));
	}

	Ok(())
}

// vim: ts=4
