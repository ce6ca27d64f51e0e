//! PostgreSQL metadata adapter
//!
//! Owns the connection pool and implements [`kaji::meta_adapter::MetaAdapter`].
//! Queries live in per-entity modules; this crate maps database failures to
//! the server's error taxonomy and keeps SQL out of the handlers.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use std::time::Duration;
use uuid::Uuid;

use kaji::{
	meta_adapter::{self, MetaAdapter},
	prelude::*,
	types::{ChatRole, Paginated, ReportStatus, Role, User},
};

mod chat;
mod exploit;
mod log;
mod report;
mod schema;
mod user;
mod version;

// Helper functions
//******************
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a single-row result, turning `RowNotFound` into a 404 for `entity`
pub(crate) fn map_res<T, F>(
	row: Result<PgRow, sqlx::Error>,
	entity: &str,
	f: F,
) -> ApiResult<T>
where
	F: FnOnce(&PgRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(&row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::not_found(format!("{} not found", entity))),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

pub(crate) fn collect_res<T, F>(rows: Result<Vec<PgRow>, sqlx::Error>, f: F) -> ApiResult<Vec<T>>
where
	F: Fn(&PgRow) -> Result<T, sqlx::Error>,
{
	let rows = rows.inspect_err(inspect).map_err(|_| Error::DbError)?;
	let mut items = Vec::with_capacity(rows.len());
	for row in &rows {
		items.push(f(row).inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

/// Decode a text column into one of the server's string-backed enums
pub(crate) fn parse_col<T>(row: &PgRow, col: &str) -> Result<T, sqlx::Error>
where
	T: std::str::FromStr,
{
	use sqlx::Row;
	let raw: String = row.try_get(col)?;
	raw.parse().map_err(|_| sqlx::Error::ColumnDecode {
		index: col.into(),
		source: format!("unexpected value {:?}", raw).into(),
	})
}

pub(crate) fn opt_box(val: Option<String>) -> Option<Box<str>> {
	val.map(Into::into)
}

#[derive(Debug)]
pub struct MetaAdapterPostgres {
	db: PgPool,
}

impl MetaAdapterPostgres {
	/// Connect with the pool limits the service has always run with and
	/// bring the schema up to date.
	pub async fn new(database_url: &str) -> ApiResult<Self> {
		let db = PgPoolOptions::new()
			.max_connections(20)
			.acquire_timeout(Duration::from_secs(2))
			.idle_timeout(Duration::from_secs(30))
			.connect(database_url)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;

		schema::init_db(&db).await.inspect_err(inspect).map_err(|_| Error::DbError)?;

		Ok(Self { db })
	}
}

#[async_trait]
impl MetaAdapter for MetaAdapterPostgres {
	async fn check(&self) -> ApiResult<()> {
		sqlx::query("SELECT 1")
			.execute(&self.db)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
		Ok(())
	}

	// Users
	//*******
	async fn read_user(&self, id: Uuid) -> ApiResult<User> {
		user::read(&self.db, id).await
	}

	async fn update_user_email(&self, id: Uuid, email: &str) -> ApiResult<User> {
		user::update_email(&self.db, id, email).await
	}

	async fn read_user_stats(&self, id: Uuid) -> ApiResult<meta_adapter::UserStats> {
		user::stats(&self.db, id).await
	}

	async fn list_users(
		&self,
		opts: &meta_adapter::ListUserOptions,
	) -> ApiResult<Paginated<meta_adapter::AdminUser>> {
		user::list(&self.db, opts).await
	}

	async fn update_user_role(&self, id: Uuid, role: Role) -> ApiResult<User> {
		user::update_role(&self.db, id, role).await
	}

	// OS versions
	//*************
	async fn list_versions(
		&self,
		current_only: bool,
	) -> ApiResult<Vec<meta_adapter::VersionWithCounts>> {
		version::list(&self.db, current_only).await
	}

	async fn read_version(&self, id: Uuid) -> ApiResult<meta_adapter::VersionWithCounts> {
		version::read(&self.db, id).await
	}

	async fn create_version(
		&self,
		data: &meta_adapter::CreateVersion,
	) -> ApiResult<meta_adapter::OsVersion> {
		version::create(&self.db, data).await
	}

	async fn update_version(
		&self,
		id: Uuid,
		data: &meta_adapter::UpdateVersion,
	) -> ApiResult<meta_adapter::OsVersion> {
		version::update(&self.db, id, data).await
	}

	async fn set_current_version(&self, id: Uuid) -> ApiResult<()> {
		version::set_current(&self.db, id).await
	}

	async fn version_stats(
		&self,
	) -> ApiResult<(meta_adapter::VersionOverview, Vec<meta_adapter::VersionDistribution>)> {
		version::stats(&self.db).await
	}

	// Exploits
	//**********
	async fn list_exploits(
		&self,
		opts: &meta_adapter::ListExploitOptions,
	) -> ApiResult<Paginated<meta_adapter::Exploit>> {
		exploit::list(&self.db, opts).await
	}

	async fn read_exploit(&self, id: Uuid) -> ApiResult<meta_adapter::Exploit> {
		exploit::read(&self.db, id).await
	}

	async fn create_exploit(
		&self,
		created_by: Uuid,
		data: &meta_adapter::CreateExploit,
	) -> ApiResult<meta_adapter::Exploit> {
		exploit::create(&self.db, created_by, data).await
	}

	async fn update_exploit(
		&self,
		id: Uuid,
		data: &meta_adapter::UpdateExploit,
	) -> ApiResult<meta_adapter::Exploit> {
		exploit::update(&self.db, id, data).await
	}

	async fn delete_exploit(&self, id: Uuid) -> ApiResult<()> {
		exploit::delete(&self.db, id).await
	}

	// Reports
	//*********
	async fn create_report(
		&self,
		user_id: Option<Uuid>,
		data: &meta_adapter::CreateReport,
	) -> ApiResult<meta_adapter::Report> {
		report::create(&self.db, user_id, data).await
	}

	async fn set_report_analysis(&self, id: Uuid, analysis: &str) -> ApiResult<()> {
		report::set_analysis(&self.db, id, analysis).await
	}

	async fn list_reports(
		&self,
		opts: &meta_adapter::ListReportOptions,
	) -> ApiResult<Paginated<meta_adapter::Report>> {
		report::list(&self.db, opts).await
	}

	async fn read_report(&self, id: Uuid) -> ApiResult<meta_adapter::Report> {
		report::read(&self.db, id).await
	}

	async fn update_report_status(
		&self,
		id: Uuid,
		status: ReportStatus,
		admin_notes: Option<&str>,
	) -> ApiResult<meta_adapter::Report> {
		report::update_status(&self.db, id, status, admin_notes).await
	}

	async fn report_stats(
		&self,
	) -> ApiResult<(meta_adapter::ReportOverview, Vec<meta_adapter::ReportTimelineEntry>)> {
		report::stats(&self.db).await
	}

	// Chat
	//******
	async fn create_chat_session(
		&self,
		user_id: Option<Uuid>,
		session_name: Option<&str>,
	) -> ApiResult<meta_adapter::ChatSession> {
		chat::create_session(&self.db, user_id, session_name).await
	}

	async fn list_chat_sessions(
		&self,
		user_id: Option<Uuid>,
	) -> ApiResult<Vec<meta_adapter::ChatSessionSummary>> {
		chat::list_sessions(&self.db, user_id).await
	}

	async fn read_chat_session(&self, id: Uuid) -> ApiResult<meta_adapter::ChatSession> {
		chat::read_session(&self.db, id).await
	}

	async fn list_chat_messages(
		&self,
		session_id: Uuid,
		limit: i64,
		offset: i64,
	) -> ApiResult<Vec<meta_adapter::ChatMessage>> {
		chat::list_messages(&self.db, session_id, limit, offset).await
	}

	async fn list_recent_chat_messages(
		&self,
		session_id: Uuid,
		limit: i64,
	) -> ApiResult<Vec<meta_adapter::ChatMessage>> {
		chat::list_recent_messages(&self.db, session_id, limit).await
	}

	async fn create_chat_message(
		&self,
		session_id: Uuid,
		role: ChatRole,
		content: &str,
		metadata: Option<&Value>,
	) -> ApiResult<meta_adapter::ChatMessage> {
		chat::create_message(&self.db, session_id, role, content, metadata).await
	}

	async fn touch_chat_session(&self, id: Uuid) -> ApiResult<()> {
		chat::touch_session(&self.db, id).await
	}

	async fn delete_chat_session(&self, id: Uuid, user_id: Option<Uuid>) -> ApiResult<()> {
		chat::delete_session(&self.db, id, user_id).await
	}

	// System log
	//************
	async fn write_log(&self, level: &str, message: &str, context: Option<&Value>) -> ApiResult<()> {
		log::write(&self.db, level, message, context).await
	}

	async fn list_logs(
		&self,
		opts: &meta_adapter::ListLogOptions,
	) -> ApiResult<Paginated<meta_adapter::SystemLog>> {
		log::list(&self.db, opts).await
	}

	// Admin
	//*******
	async fn admin_stats(
		&self,
	) -> ApiResult<(meta_adapter::AdminOverview, Vec<meta_adapter::ActivityItem>)> {
		log::admin_stats(&self.db).await
	}

	async fn list_training_data(
		&self,
		page: i64,
		limit: i64,
		validated_only: bool,
	) -> ApiResult<Paginated<meta_adapter::TrainingData>> {
		log::list_training_data(&self.db, page, limit, validated_only).await
	}

	async fn set_training_validated(
		&self,
		id: Uuid,
		is_validated: bool,
	) -> ApiResult<meta_adapter::TrainingData> {
		log::set_training_validated(&self.db, id, is_validated).await
	}
}

// vim: ts=4
