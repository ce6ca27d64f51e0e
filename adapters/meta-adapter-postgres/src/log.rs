//! System log, admin statistics and AI training data queries

use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, QueryBuilder, Row};
use uuid::Uuid;

use kaji::meta_adapter::{
	ActivityItem, AdminOverview, ListLogOptions, SystemLog, TrainingData,
};
use kaji::prelude::*;
use kaji::types::Paginated;

use crate::{collect_res, inspect, map_res, opt_box};

fn log_from_row(row: &PgRow) -> Result<SystemLog, sqlx::Error> {
	Ok(SystemLog {
		id: row.try_get("id")?,
		level: row.try_get::<String, _>("level")?.into(),
		message: row.try_get::<String, _>("message")?.into(),
		context: row.try_get("context")?,
		created_at: row.try_get("created_at")?,
	})
}

pub(crate) async fn write(
	db: &PgPool,
	level: &str,
	message: &str,
	context: Option<&Value>,
) -> ApiResult<()> {
	sqlx::query("INSERT INTO system_logs (level, message, context) VALUES ($1, $2, $3)")
		.bind(level)
		.bind(message)
		.bind(context)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	Ok(())
}

pub(crate) async fn list(db: &PgPool, opts: &ListLogOptions) -> ApiResult<Paginated<SystemLog>> {
	let mut query = QueryBuilder::new("SELECT * FROM system_logs WHERE true");
	let mut count = QueryBuilder::new("SELECT COUNT(*) AS total FROM system_logs WHERE true");

	if let Some(level) = &opts.level {
		for q in [&mut query, &mut count] {
			q.push(" AND level = ").push_bind(level.to_string());
		}
	}

	query.push(" ORDER BY created_at DESC LIMIT ");
	query.push_bind(opts.limit);
	query.push(" OFFSET ");
	query.push_bind((opts.page.max(1) - 1) * opts.limit);

	let rows = query.build().fetch_all(db).await;
	let items = collect_res(rows, log_from_row)?;

	let total = count.build().fetch_one(db).await;
	let total: i64 = map_res(total, "Log", |row| row.try_get("total"))?;

	Ok(Paginated::new(items, opts.page, opts.limit, total))
}

pub(crate) async fn admin_stats(db: &PgPool) -> ApiResult<(AdminOverview, Vec<ActivityItem>)> {
	let res = sqlx::query(
		"SELECT
			(SELECT COUNT(*) FROM users) AS total_users,
			(SELECT COUNT(*) FROM exploits) AS total_exploits,
			(SELECT COUNT(*) FROM user_reports) AS total_reports,
			(SELECT COUNT(*) FROM chat_sessions) AS total_chat_sessions,
			(SELECT COUNT(*) FROM os_versions) AS total_versions,
			(SELECT COUNT(*) FROM ai_training_data) AS total_training_data,
			(SELECT COUNT(*) FROM system_logs
				WHERE level = 'error' AND created_at >= CURRENT_DATE - INTERVAL '7 days') AS recent_errors",
	)
	.fetch_one(db)
	.await;

	let overview = map_res(res, "Stats", |row| {
		Ok(AdminOverview {
			total_users: row.try_get("total_users")?,
			total_exploits: row.try_get("total_exploits")?,
			total_reports: row.try_get("total_reports")?,
			total_chat_sessions: row.try_get("total_chat_sessions")?,
			total_versions: row.try_get("total_versions")?,
			total_training_data: row.try_get("total_training_data")?,
			recent_errors: row.try_get("recent_errors")?,
		})
	})?;

	let rows = sqlx::query(
		"SELECT 'exploit' AS type, title AS name, created_at
			FROM exploits WHERE created_at >= CURRENT_DATE - INTERVAL '7 days'
		UNION ALL
		SELECT 'report' AS type, title AS name, created_at
			FROM user_reports WHERE created_at >= CURRENT_DATE - INTERVAL '7 days'
		UNION ALL
		SELECT 'user' AS type, username AS name, created_at
			FROM users WHERE created_at >= CURRENT_DATE - INTERVAL '7 days'
		ORDER BY created_at DESC
		LIMIT 20",
	)
	.fetch_all(db)
	.await;

	let activity = collect_res(rows, |row| {
		Ok(ActivityItem {
			kind: row.try_get::<String, _>("type")?.into(),
			name: row.try_get::<String, _>("name")?.into(),
			created_at: row.try_get("created_at")?,
		})
	})?;

	Ok((overview, activity))
}

fn training_from_row(row: &PgRow) -> Result<TrainingData, sqlx::Error> {
	let severity: Option<String> = row.try_get("severity")?;
	Ok(TrainingData {
		id: row.try_get("id")?,
		exploit_id: row.try_get("exploit_id")?,
		exploit_title: opt_box(row.try_get("exploit_title")?),
		severity: severity.and_then(|s| s.parse().ok()),
		training_prompt: row.try_get::<String, _>("training_prompt")?.into(),
		ai_response: row.try_get::<String, _>("ai_response")?.into(),
		model_version: opt_box(row.try_get("model_version")?),
		confidence_score: row.try_get("confidence_score")?,
		is_validated: row.try_get("is_validated")?,
		created_at: row.try_get("created_at")?,
	})
}

const TRAINING_SELECT: &str = "SELECT
	t.*, e.title AS exploit_title, e.severity
	FROM ai_training_data t
	LEFT JOIN exploits e ON t.exploit_id = e.id";

pub(crate) async fn list_training_data(
	db: &PgPool,
	page: i64,
	limit: i64,
	validated_only: bool,
) -> ApiResult<Paginated<TrainingData>> {
	let where_clause = if validated_only { " WHERE t.is_validated = true" } else { "" };
	let sql = format!(
		"{}{} ORDER BY t.created_at DESC LIMIT $1 OFFSET $2",
		TRAINING_SELECT, where_clause,
	);
	let rows = sqlx::query(&sql)
		.bind(limit)
		.bind((page.max(1) - 1) * limit)
		.fetch_all(db)
		.await;
	let items = collect_res(rows, training_from_row)?;

	let count_sql = format!(
		"SELECT COUNT(*) AS total FROM ai_training_data t{}",
		if validated_only { " WHERE t.is_validated = true" } else { "" },
	);
	let total = sqlx::query(&count_sql).fetch_one(db).await;
	let total: i64 = map_res(total, "Training data", |row| row.try_get("total"))?;

	Ok(Paginated::new(items, page, limit, total))
}

pub(crate) async fn set_training_validated(
	db: &PgPool,
	id: Uuid,
	is_validated: bool,
) -> ApiResult<TrainingData> {
	let res = sqlx::query("UPDATE ai_training_data SET is_validated = $1 WHERE id = $2 RETURNING id")
		.bind(is_validated)
		.bind(id)
		.fetch_one(db)
		.await;

	let id: Uuid = map_res(res, "Training data", |row| row.try_get("id"))?;

	let sql = format!("{} WHERE t.id = $1", TRAINING_SELECT);
	let res = sqlx::query(&sql).bind(id).fetch_one(db).await;
	map_res(res, "Training data", training_from_row)
}

// vim: ts=4
