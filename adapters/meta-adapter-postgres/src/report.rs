//! User report queries

use sqlx::{postgres::PgRow, PgPool, QueryBuilder, Row};
use uuid::Uuid;

use kaji::meta_adapter::{
	CreateReport, ListReportOptions, Report, ReportOverview, ReportTimelineEntry,
};
use kaji::prelude::*;
use kaji::types::{Paginated, ReportStatus};

use crate::{collect_res, inspect, map_res, opt_box, parse_col};

const SELECT: &str = "SELECT
	r.*, u.username, e.title AS exploit_title, v.version AS os_version
	FROM user_reports r
	LEFT JOIN users u ON r.user_id = u.id
	LEFT JOIN exploits e ON r.exploit_id = e.id
	LEFT JOIN os_versions v ON r.os_version_id = v.id";

fn report_from_row(row: &PgRow) -> Result<Report, sqlx::Error> {
	Ok(Report {
		id: row.try_get("id")?,
		user_id: row.try_get("user_id")?,
		username: opt_box(row.try_get("username")?),
		report_type: parse_col(row, "report_type")?,
		title: row.try_get::<String, _>("title")?.into(),
		description: row.try_get::<String, _>("description")?.into(),
		exploit_id: row.try_get("exploit_id")?,
		exploit_title: opt_box(row.try_get("exploit_title")?),
		os_version_id: row.try_get("os_version_id")?,
		os_version: opt_box(row.try_get("os_version")?),
		status: parse_col(row, "status")?,
		ai_analysis: opt_box(row.try_get("ai_analysis")?),
		admin_notes: opt_box(row.try_get("admin_notes")?),
		created_at: row.try_get("created_at")?,
		updated_at: row.try_get("updated_at")?,
	})
}

pub(crate) async fn create(
	db: &PgPool,
	user_id: Option<Uuid>,
	data: &CreateReport,
) -> ApiResult<Report> {
	let res = sqlx::query(
		"INSERT INTO user_reports (user_id, report_type, title, description, exploit_id, os_version_id)
		VALUES ($1, $2, $3, $4, $5, $6)
		RETURNING id",
	)
	.bind(user_id)
	.bind(data.report_type.as_str())
	.bind(data.title.as_ref())
	.bind(data.description.as_ref())
	.bind(data.exploit_id)
	.bind(data.os_version_id)
	.fetch_one(db)
	.await;

	let id: Uuid = map_res(res, "Report", |row| row.try_get("id"))?;
	read(db, id).await
}

pub(crate) async fn set_analysis(db: &PgPool, id: Uuid, analysis: &str) -> ApiResult<()> {
	sqlx::query("UPDATE user_reports SET ai_analysis = $1 WHERE id = $2")
		.bind(analysis)
		.bind(id)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	Ok(())
}

pub(crate) async fn list(db: &PgPool, opts: &ListReportOptions) -> ApiResult<Paginated<Report>> {
	let mut query = QueryBuilder::new(format!("{} WHERE true", SELECT));
	let mut count = QueryBuilder::new("SELECT COUNT(*) AS total FROM user_reports r WHERE true");

	for q in [&mut query, &mut count] {
		if let Some(status) = opts.status {
			q.push(" AND r.status = ").push_bind(status.as_str());
		}
		if let Some(report_type) = opts.report_type {
			q.push(" AND r.report_type = ").push_bind(report_type.as_str());
		}
		if let Some(user_id) = opts.user_id {
			q.push(" AND r.user_id = ").push_bind(user_id);
		}
	}

	query.push(" ORDER BY r.created_at DESC LIMIT ");
	query.push_bind(opts.limit);
	query.push(" OFFSET ");
	query.push_bind((opts.page.max(1) - 1) * opts.limit);

	let rows = query.build().fetch_all(db).await;
	let items = collect_res(rows, report_from_row)?;

	let total = count.build().fetch_one(db).await;
	let total: i64 = map_res(total, "Report", |row| row.try_get("total"))?;

	Ok(Paginated::new(items, opts.page, opts.limit, total))
}

pub(crate) async fn read(db: &PgPool, id: Uuid) -> ApiResult<Report> {
	let sql = format!("{} WHERE r.id = $1", SELECT);
	let res = sqlx::query(&sql).bind(id).fetch_one(db).await;

	map_res(res, "Report", report_from_row)
}

pub(crate) async fn update_status(
	db: &PgPool,
	id: Uuid,
	status: ReportStatus,
	admin_notes: Option<&str>,
) -> ApiResult<Report> {
	let res = sqlx::query(
		"UPDATE user_reports SET status = $1, admin_notes = $2, updated_at = now()
		WHERE id = $3
		RETURNING id",
	)
	.bind(status.as_str())
	.bind(admin_notes)
	.bind(id)
	.fetch_one(db)
	.await;

	let id: Uuid = map_res(res, "Report", |row| row.try_get("id"))?;
	read(db, id).await
}

pub(crate) async fn stats(db: &PgPool) -> ApiResult<(ReportOverview, Vec<ReportTimelineEntry>)> {
	let res = sqlx::query(
		"SELECT
			COUNT(*) AS total_reports,
			COUNT(*) FILTER (WHERE status = 'pending') AS pending_count,
			COUNT(*) FILTER (WHERE status = 'reviewing') AS reviewing_count,
			COUNT(*) FILTER (WHERE status = 'accepted') AS accepted_count,
			COUNT(*) FILTER (WHERE status = 'rejected') AS rejected_count,
			COUNT(*) FILTER (WHERE created_at >= CURRENT_DATE - INTERVAL '7 days') AS recent_reports
		FROM user_reports",
	)
	.fetch_one(db)
	.await;

	let overview = map_res(res, "Report", |row| {
		Ok(ReportOverview {
			total_reports: row.try_get("total_reports")?,
			pending_count: row.try_get("pending_count")?,
			reviewing_count: row.try_get("reviewing_count")?,
			accepted_count: row.try_get("accepted_count")?,
			rejected_count: row.try_get("rejected_count")?,
			recent_reports: row.try_get("recent_reports")?,
		})
	})?;

	let rows = sqlx::query(
		"SELECT created_at::date AS date, status, COUNT(*) AS count
		FROM user_reports
		WHERE created_at >= CURRENT_DATE - INTERVAL '30 days'
		GROUP BY created_at::date, status
		ORDER BY date DESC",
	)
	.fetch_all(db)
	.await;

	let timeline = collect_res(rows, |row| {
		Ok(ReportTimelineEntry {
			date: row.try_get("date")?,
			status: parse_col(row, "status")?,
			count: row.try_get("count")?,
		})
	})?;

	Ok((overview, timeline))
}

// vim: ts=4
