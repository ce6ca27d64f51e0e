//! Exploit catalogue queries

use sqlx::{postgres::PgRow, PgPool, QueryBuilder, Row};
use uuid::Uuid;

use kaji::meta_adapter::{CreateExploit, Exploit, ListExploitOptions, UpdateExploit};
use kaji::prelude::*;
use kaji::types::Paginated;

use crate::{collect_res, inspect, map_res, opt_box, parse_col};

const SELECT: &str = "SELECT
	e.*, c.name AS category_name, u.username AS created_by_username
	FROM exploits e
	LEFT JOIN vulnerability_categories c ON e.category_id = c.id
	LEFT JOIN users u ON e.created_by = u.id";

pub(crate) fn exploit_from_row(row: &PgRow) -> Result<Exploit, sqlx::Error> {
	let tags: Option<Vec<String>> = row.try_get("tags")?;
	Ok(Exploit {
		id: row.try_get("id")?,
		cve_id: opt_box(row.try_get("cve_id")?),
		title: row.try_get::<String, _>("title")?.into(),
		description: row.try_get::<String, _>("description")?.into(),
		severity: parse_col(row, "severity")?,
		cvss_score: row.try_get("cvss_score")?,
		category_id: row.try_get("category_id")?,
		category_name: opt_box(row.try_get("category_name")?),
		os_version_id: row.try_get("os_version_id")?,
		discovered_date: row.try_get("discovered_date")?,
		disclosed_date: row.try_get("disclosed_date")?,
		patched_date: row.try_get("patched_date")?,
		exploit_code: opt_box(row.try_get("exploit_code")?),
		proof_of_concept: opt_box(row.try_get("proof_of_concept")?),
		references: row.try_get("refs")?,
		tags: tags.map(|tags| tags.into_iter().map(Into::into).collect()),
		is_verified: row.try_get("is_verified")?,
		is_public: row.try_get("is_public")?,
		created_by: row.try_get("created_by")?,
		created_by_username: opt_box(row.try_get("created_by_username")?),
		created_at: row.try_get("created_at")?,
		updated_at: row.try_get("updated_at")?,
	})
}

fn push_filters<'a>(query: &mut QueryBuilder<'a, sqlx::Postgres>, opts: &'a ListExploitOptions) {
	if !opts.include_private {
		query.push(" AND e.is_public = true");
	}
	if let Some(severity) = opts.severity {
		query.push(" AND e.severity = ").push_bind(severity.as_str());
	}
	if let Some(os_version_id) = opts.os_version_id {
		query.push(" AND e.os_version_id = ").push_bind(os_version_id);
	}
	if let Some(category_id) = opts.category_id {
		query.push(" AND e.category_id = ").push_bind(category_id);
	}
	if let Some(search) = &opts.search {
		let pattern = format!("%{}%", search);
		query.push(" AND (e.title ILIKE ").push_bind(pattern.clone());
		query.push(" OR e.description ILIKE ").push_bind(pattern.clone());
		query.push(" OR e.cve_id ILIKE ").push_bind(pattern);
		query.push(")");
	}
}

pub(crate) async fn list(db: &PgPool, opts: &ListExploitOptions) -> ApiResult<Paginated<Exploit>> {
	let mut query = QueryBuilder::new(format!("{} WHERE true", SELECT));
	push_filters(&mut query, opts);
	query.push(" ORDER BY e.discovered_date DESC NULLS LAST, e.created_at DESC LIMIT ");
	query.push_bind(opts.limit);
	query.push(" OFFSET ");
	query.push_bind((opts.page.max(1) - 1) * opts.limit);

	let rows = query.build().fetch_all(db).await;
	let items = collect_res(rows, exploit_from_row)?;

	let mut count = QueryBuilder::new("SELECT COUNT(*) AS total FROM exploits e WHERE true");
	push_filters(&mut count, opts);
	let total = count.build().fetch_one(db).await;
	let total: i64 = map_res(total, "Exploit", |row| row.try_get("total"))?;

	Ok(Paginated::new(items, opts.page, opts.limit, total))
}

pub(crate) async fn read(db: &PgPool, id: Uuid) -> ApiResult<Exploit> {
	let sql = format!("{} WHERE e.id = $1", SELECT);
	let res = sqlx::query(&sql).bind(id).fetch_one(db).await;

	map_res(res, "Exploit", exploit_from_row)
}

pub(crate) async fn create(db: &PgPool, created_by: Uuid, data: &CreateExploit) -> ApiResult<Exploit> {
	let tags: Option<Vec<String>> =
		data.tags.as_ref().map(|tags| tags.iter().map(|t| t.to_string()).collect());

	let res = sqlx::query(
		"INSERT INTO exploits (
			cve_id, title, description, severity, cvss_score, category_id, os_version_id,
			discovered_date, disclosed_date, patched_date, exploit_code, proof_of_concept,
			refs, tags, is_public, created_by
		) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
		RETURNING id",
	)
	.bind(data.cve_id.as_deref())
	.bind(data.title.as_ref())
	.bind(data.description.as_ref())
	.bind(data.severity.as_str())
	.bind(data.cvss_score)
	.bind(data.category_id)
	.bind(data.os_version_id)
	.bind(data.discovered_date)
	.bind(data.disclosed_date)
	.bind(data.patched_date)
	.bind(data.exploit_code.as_deref())
	.bind(data.proof_of_concept.as_deref())
	.bind(data.references.as_ref())
	.bind(tags)
	.bind(data.is_public)
	.bind(created_by)
	.fetch_one(db)
	.await;

	let id: Uuid = map_res(res, "Exploit", |row| row.try_get("id"))?;
	read(db, id).await
}

pub(crate) async fn update(db: &PgPool, id: Uuid, data: &UpdateExploit) -> ApiResult<Exploit> {
	let mut query = QueryBuilder::new("UPDATE exploits SET updated_at = now()");

	if let Some(cve_id) = &data.cve_id {
		query.push(", cve_id = ").push_bind(cve_id.as_ref());
	}
	if let Some(title) = &data.title {
		query.push(", title = ").push_bind(title.as_ref());
	}
	if let Some(description) = &data.description {
		query.push(", description = ").push_bind(description.as_ref());
	}
	if let Some(severity) = data.severity {
		query.push(", severity = ").push_bind(severity.as_str());
	}
	if let Some(cvss_score) = data.cvss_score {
		query.push(", cvss_score = ").push_bind(cvss_score);
	}
	if let Some(category_id) = data.category_id {
		query.push(", category_id = ").push_bind(category_id);
	}
	if let Some(discovered_date) = data.discovered_date {
		query.push(", discovered_date = ").push_bind(discovered_date);
	}
	if let Some(disclosed_date) = data.disclosed_date {
		query.push(", disclosed_date = ").push_bind(disclosed_date);
	}
	if let Some(patched_date) = data.patched_date {
		query.push(", patched_date = ").push_bind(patched_date);
	}
	if let Some(exploit_code) = &data.exploit_code {
		query.push(", exploit_code = ").push_bind(exploit_code.as_ref());
	}
	if let Some(proof_of_concept) = &data.proof_of_concept {
		query.push(", proof_of_concept = ").push_bind(proof_of_concept.as_ref());
	}
	if let Some(references) = &data.references {
		query.push(", refs = ").push_bind(references);
	}
	if let Some(tags) = &data.tags {
		let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
		query.push(", tags = ").push_bind(tags);
	}
	if let Some(is_verified) = data.is_verified {
		query.push(", is_verified = ").push_bind(is_verified);
	}
	if let Some(is_public) = data.is_public {
		query.push(", is_public = ").push_bind(is_public);
	}

	query.push(" WHERE id = ").push_bind(id);
	query.push(" RETURNING id");

	let res = query.build().fetch_one(db).await;
	let id: Uuid = map_res(res, "Exploit", |row| row.try_get("id"))?;

	read(db, id).await
}

pub(crate) async fn delete(db: &PgPool, id: Uuid) -> ApiResult<()> {
	let deleted = sqlx::query("DELETE FROM exploits WHERE id = $1")
		.bind(id)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	if deleted.rows_affected() == 0 {
		return Err(Error::not_found("Exploit not found"));
	}

	Ok(())
}

// vim: ts=4
