//! OS version catalogue queries

use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use kaji::meta_adapter::{
	CreateVersion, OsVersion, UpdateVersion, VersionDistribution, VersionOverview,
	VersionWithCounts,
};
use kaji::prelude::*;

use crate::{collect_res, inspect, map_res, opt_box};

fn version_from_row(row: &PgRow) -> Result<OsVersion, sqlx::Error> {
	Ok(OsVersion {
		id: row.try_get("id")?,
		version: row.try_get::<String, _>("version")?.into(),
		build_number: opt_box(row.try_get("build_number")?),
		release_date: row.try_get("release_date")?,
		end_of_life_date: row.try_get("end_of_life_date")?,
		is_stable: row.try_get("is_stable")?,
		is_current: row.try_get("is_current")?,
		created_at: row.try_get("created_at")?,
		updated_at: row.try_get("updated_at")?,
	})
}

fn with_counts_from_row(row: &PgRow) -> Result<VersionWithCounts, sqlx::Error> {
	Ok(VersionWithCounts {
		version: version_from_row(row)?,
		exploit_count: row.try_get("exploit_count")?,
		critical_exploits: row.try_get("critical_exploits")?,
		high_exploits: row.try_get("high_exploits")?,
	})
}

const COUNT_COLUMNS: &str = "
	COUNT(e.id) AS exploit_count,
	COUNT(*) FILTER (WHERE e.severity = 'critical') AS critical_exploits,
	COUNT(*) FILTER (WHERE e.severity = 'high') AS high_exploits";

pub(crate) async fn list(db: &PgPool, current_only: bool) -> ApiResult<Vec<VersionWithCounts>> {
	let where_clause = if current_only { "WHERE v.is_current = true" } else { "" };
	let sql = format!(
		"SELECT v.*, {} FROM os_versions v
		LEFT JOIN exploits e ON v.id = e.os_version_id AND e.is_public = true
		{}
		GROUP BY v.id
		ORDER BY v.release_date DESC NULLS LAST",
		COUNT_COLUMNS, where_clause,
	);
	let rows = sqlx::query(&sql).fetch_all(db).await;

	collect_res(rows, with_counts_from_row)
}

pub(crate) async fn read(db: &PgPool, id: Uuid) -> ApiResult<VersionWithCounts> {
	let sql = format!(
		"SELECT v.*, {} FROM os_versions v
		LEFT JOIN exploits e ON v.id = e.os_version_id AND e.is_public = true
		WHERE v.id = $1
		GROUP BY v.id",
		COUNT_COLUMNS,
	);
	let res = sqlx::query(&sql).bind(id).fetch_one(db).await;

	map_res(res, "OS version", with_counts_from_row)
}

pub(crate) async fn create(db: &PgPool, data: &CreateVersion) -> ApiResult<OsVersion> {
	let existing = sqlx::query("SELECT id FROM os_versions WHERE version = $1")
		.bind(data.version.as_ref())
		.fetch_optional(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	if existing.is_some() {
		return Err(Error::conflict("OS version already exists"));
	}

	let res = sqlx::query(
		"INSERT INTO os_versions (version, build_number, release_date, end_of_life_date, is_stable)
		VALUES ($1, $2, $3, $4, $5)
		RETURNING *",
	)
	.bind(data.version.as_ref())
	.bind(data.build_number.as_deref())
	.bind(data.release_date)
	.bind(data.end_of_life_date)
	.bind(data.is_stable)
	.fetch_one(db)
	.await;

	map_res(res, "OS version", version_from_row)
}

pub(crate) async fn update(db: &PgPool, id: Uuid, data: &UpdateVersion) -> ApiResult<OsVersion> {
	let mut query = sqlx::QueryBuilder::new("UPDATE os_versions SET updated_at = now()");

	if let Some(version) = &data.version {
		query.push(", version = ").push_bind(version.as_ref());
	}
	if let Some(build_number) = &data.build_number {
		query.push(", build_number = ").push_bind(build_number.as_ref());
	}
	if let Some(release_date) = data.release_date {
		query.push(", release_date = ").push_bind(release_date);
	}
	if let Some(end_of_life_date) = data.end_of_life_date {
		query.push(", end_of_life_date = ").push_bind(end_of_life_date);
	}
	if let Some(is_stable) = data.is_stable {
		query.push(", is_stable = ").push_bind(is_stable);
	}

	query.push(" WHERE id = ").push_bind(id);
	query.push(" RETURNING *");

	let res = query.build().fetch_one(db).await;

	map_res(res, "OS version", version_from_row)
}

pub(crate) async fn set_current(db: &PgPool, id: Uuid) -> ApiResult<()> {
	let mut tx = db.begin().await.inspect_err(inspect).map_err(|_| Error::DbError)?;

	sqlx::query("UPDATE os_versions SET is_current = false WHERE is_current = true")
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	let updated = sqlx::query("UPDATE os_versions SET is_current = true, updated_at = now() WHERE id = $1")
		.bind(id)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	if updated.rows_affected() == 0 {
		// rollback on drop
		return Err(Error::not_found("OS version not found"));
	}

	tx.commit().await.inspect_err(inspect).map_err(|_| Error::DbError)
}

pub(crate) async fn stats(db: &PgPool) -> ApiResult<(VersionOverview, Vec<VersionDistribution>)> {
	let res = sqlx::query(
		"SELECT
			COUNT(*) AS total_versions,
			COUNT(*) FILTER (WHERE is_current) AS current_versions,
			COUNT(*) FILTER (WHERE is_stable) AS stable_versions,
			COUNT(*) FILTER (WHERE end_of_life_date IS NOT NULL AND end_of_life_date < CURRENT_DATE) AS eol_versions,
			COUNT(*) FILTER (WHERE release_date >= CURRENT_DATE - INTERVAL '1 year') AS recent_versions
		FROM os_versions",
	)
	.fetch_one(db)
	.await;

	let overview = map_res(res, "OS version", |row| {
		Ok(VersionOverview {
			total_versions: row.try_get("total_versions")?,
			current_versions: row.try_get("current_versions")?,
			stable_versions: row.try_get("stable_versions")?,
			eol_versions: row.try_get("eol_versions")?,
			recent_versions: row.try_get("recent_versions")?,
		})
	})?;

	let rows = sqlx::query(
		"SELECT
			v.version, v.is_current,
			COUNT(e.id) AS exploit_count,
			COUNT(*) FILTER (WHERE e.severity = 'critical') AS critical_count
		FROM os_versions v
		LEFT JOIN exploits e ON v.id = e.os_version_id AND e.is_public = true
		GROUP BY v.id, v.version, v.is_current
		ORDER BY v.release_date DESC NULLS LAST
		LIMIT 10",
	)
	.fetch_all(db)
	.await;

	let distribution = collect_res(rows, |row| {
		Ok(VersionDistribution {
			version: row.try_get::<String, _>("version")?.into(),
			is_current: row.try_get("is_current")?,
			exploit_count: row.try_get("exploit_count")?,
			critical_count: row.try_get("critical_count")?,
		})
	})?;

	Ok((overview, distribution))
}

// vim: ts=4
