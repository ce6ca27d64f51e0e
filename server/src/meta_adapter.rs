//! Data adapter interface: catalogue, exploits, reports, chat and audit log
//!
//! The wire format of the row types below is the API's response format
//! (snake_case, like the relational columns they mirror), so handlers can
//! serialize adapter results directly.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::types::{ChatRole, Paginated, ReportStatus, ReportType, Role, Severity, User};

// OS versions //
//*************//
#[derive(Clone, Debug, Serialize)]
pub struct OsVersion {
	pub id: Uuid,
	pub version: Box<str>,
	pub build_number: Option<Box<str>>,
	pub release_date: Option<NaiveDate>,
	pub end_of_life_date: Option<NaiveDate>,
	pub is_stable: bool,
	pub is_current: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Version row joined with per-severity exploit counts
#[derive(Clone, Debug, Serialize)]
pub struct VersionWithCounts {
	#[serde(flatten)]
	pub version: OsVersion,
	pub exploit_count: i64,
	pub critical_exploits: i64,
	pub high_exploits: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateVersion {
	pub version: Box<str>,
	pub build_number: Option<Box<str>>,
	pub release_date: Option<NaiveDate>,
	pub end_of_life_date: Option<NaiveDate>,
	#[serde(default = "default_true")]
	pub is_stable: bool,
}

fn default_true() -> bool {
	true
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateVersion {
	pub version: Option<Box<str>>,
	pub build_number: Option<Box<str>>,
	pub release_date: Option<NaiveDate>,
	pub end_of_life_date: Option<NaiveDate>,
	pub is_stable: Option<bool>,
}

impl UpdateVersion {
	pub fn is_empty(&self) -> bool {
		self.version.is_none()
			&& self.build_number.is_none()
			&& self.release_date.is_none()
			&& self.end_of_life_date.is_none()
			&& self.is_stable.is_none()
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct VersionOverview {
	pub total_versions: i64,
	pub current_versions: i64,
	pub stable_versions: i64,
	pub eol_versions: i64,
	pub recent_versions: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct VersionDistribution {
	pub version: Box<str>,
	pub is_current: bool,
	pub exploit_count: i64,
	pub critical_count: i64,
}

// Exploits //
//**********//
#[derive(Clone, Debug, Serialize)]
pub struct Exploit {
	pub id: Uuid,
	pub cve_id: Option<Box<str>>,
	pub title: Box<str>,
	pub description: Box<str>,
	pub severity: Severity,
	pub cvss_score: Option<f64>,
	pub category_id: Option<Uuid>,
	pub category_name: Option<Box<str>>,
	pub os_version_id: Uuid,
	pub discovered_date: Option<NaiveDate>,
	pub disclosed_date: Option<NaiveDate>,
	pub patched_date: Option<NaiveDate>,
	pub exploit_code: Option<Box<str>>,
	pub proof_of_concept: Option<Box<str>>,
	pub references: Option<Value>,
	pub tags: Option<Vec<Box<str>>>,
	pub is_verified: bool,
	pub is_public: bool,
	pub created_by: Option<Uuid>,
	pub created_by_username: Option<Box<str>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateExploit {
	pub cve_id: Option<Box<str>>,
	pub title: Box<str>,
	pub description: Box<str>,
	pub severity: Severity,
	pub cvss_score: Option<f64>,
	pub category_id: Option<Uuid>,
	pub os_version_id: Uuid,
	pub discovered_date: Option<NaiveDate>,
	pub disclosed_date: Option<NaiveDate>,
	pub patched_date: Option<NaiveDate>,
	pub exploit_code: Option<Box<str>>,
	pub proof_of_concept: Option<Box<str>>,
	pub references: Option<Value>,
	pub tags: Option<Vec<Box<str>>>,
	#[serde(default)]
	pub is_public: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateExploit {
	pub cve_id: Option<Box<str>>,
	pub title: Option<Box<str>>,
	pub description: Option<Box<str>>,
	pub severity: Option<Severity>,
	pub cvss_score: Option<f64>,
	pub category_id: Option<Uuid>,
	pub discovered_date: Option<NaiveDate>,
	pub disclosed_date: Option<NaiveDate>,
	pub patched_date: Option<NaiveDate>,
	pub exploit_code: Option<Box<str>>,
	pub proof_of_concept: Option<Box<str>>,
	pub references: Option<Value>,
	pub tags: Option<Vec<Box<str>>>,
	pub is_verified: Option<bool>,
	pub is_public: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct ListExploitOptions {
	pub page: i64,
	pub limit: i64,
	pub severity: Option<Severity>,
	pub os_version_id: Option<Uuid>,
	pub category_id: Option<Uuid>,
	/// Case-insensitive match against title, description and cve_id
	pub search: Option<Box<str>>,
	/// `false` for anonymous callers: only public exploits are visible
	pub include_private: bool,
}

// Reports //
//*********//
#[derive(Clone, Debug, Serialize)]
pub struct Report {
	pub id: Uuid,
	pub user_id: Option<Uuid>,
	pub username: Option<Box<str>>,
	pub report_type: ReportType,
	pub title: Box<str>,
	pub description: Box<str>,
	pub exploit_id: Option<Uuid>,
	pub exploit_title: Option<Box<str>>,
	pub os_version_id: Option<Uuid>,
	pub os_version: Option<Box<str>>,
	pub status: ReportStatus,
	pub ai_analysis: Option<Box<str>>,
	pub admin_notes: Option<Box<str>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateReport {
	pub report_type: ReportType,
	pub title: Box<str>,
	pub description: Box<str>,
	pub exploit_id: Option<Uuid>,
	pub os_version_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default)]
pub struct ListReportOptions {
	pub page: i64,
	pub limit: i64,
	pub status: Option<ReportStatus>,
	pub report_type: Option<ReportType>,
	pub user_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportOverview {
	pub total_reports: i64,
	pub pending_count: i64,
	pub reviewing_count: i64,
	pub accepted_count: i64,
	pub rejected_count: i64,
	pub recent_reports: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportTimelineEntry {
	pub date: NaiveDate,
	pub status: ReportStatus,
	pub count: i64,
}

// Chat //
//******//
#[derive(Clone, Debug, Serialize)]
pub struct ChatSession {
	pub id: Uuid,
	pub user_id: Option<Uuid>,
	pub session_name: Option<Box<str>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatSessionSummary {
	#[serde(flatten)]
	pub session: ChatSession,
	pub message_count: i64,
	pub last_message_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
	pub id: Uuid,
	pub session_id: Uuid,
	pub role: ChatRole,
	pub content: Box<str>,
	pub metadata: Option<Value>,
	pub created_at: DateTime<Utc>,
}

// System log //
//************//
#[derive(Clone, Debug, Serialize)]
pub struct SystemLog {
	pub id: Uuid,
	pub level: Box<str>,
	pub message: Box<str>,
	pub context: Option<Value>,
	pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct ListLogOptions {
	pub page: i64,
	pub limit: i64,
	pub level: Option<Box<str>>,
}

// AI training data //
//******************//
#[derive(Clone, Debug, Serialize)]
pub struct TrainingData {
	pub id: Uuid,
	pub exploit_id: Uuid,
	pub exploit_title: Option<Box<str>>,
	pub severity: Option<Severity>,
	pub training_prompt: Box<str>,
	pub ai_response: Box<str>,
	pub model_version: Option<Box<str>>,
	pub confidence_score: Option<f64>,
	pub is_validated: bool,
	pub created_at: DateTime<Utc>,
}

// Users (profile + admin) //
//*************************//
#[derive(Clone, Debug, Serialize)]
pub struct UserStats {
	pub exploits_created: i64,
	pub reports_submitted: i64,
	pub chat_sessions: i64,
	pub accepted_reports: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AdminUser {
	#[serde(flatten)]
	pub user: User,
	pub exploits_created: i64,
	pub reports_submitted: i64,
}

#[derive(Clone, Debug, Default)]
pub struct ListUserOptions {
	pub page: i64,
	pub limit: i64,
	pub role: Option<Role>,
	pub active_only: bool,
}

// Admin stats //
//*************//
#[derive(Clone, Debug, Serialize)]
pub struct AdminOverview {
	pub total_users: i64,
	pub total_exploits: i64,
	pub total_reports: i64,
	pub total_chat_sessions: i64,
	pub total_versions: i64,
	pub total_training_data: i64,
	pub recent_errors: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActivityItem {
	#[serde(rename = "type")]
	pub kind: Box<str>,
	pub name: Box<str>,
	pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait MetaAdapter: Send + Sync + Debug {
	/// Cheap connectivity probe for the health endpoint
	async fn check(&self) -> ApiResult<()>;

	// Users
	//*******
	async fn read_user(&self, id: Uuid) -> ApiResult<User>;
	/// Update the email, enforcing uniqueness across other users
	async fn update_user_email(&self, id: Uuid, email: &str) -> ApiResult<User>;
	async fn read_user_stats(&self, id: Uuid) -> ApiResult<UserStats>;
	async fn list_users(&self, opts: &ListUserOptions) -> ApiResult<Paginated<AdminUser>>;
	async fn update_user_role(&self, id: Uuid, role: Role) -> ApiResult<User>;

	// OS versions
	//*************
	async fn list_versions(&self, current_only: bool) -> ApiResult<Vec<VersionWithCounts>>;
	async fn read_version(&self, id: Uuid) -> ApiResult<VersionWithCounts>;
	async fn create_version(&self, data: &CreateVersion) -> ApiResult<OsVersion>;
	async fn update_version(&self, id: Uuid, data: &UpdateVersion) -> ApiResult<OsVersion>;
	/// Transactional: clears the current flag everywhere, sets it on `id`
	async fn set_current_version(&self, id: Uuid) -> ApiResult<()>;
	async fn version_stats(&self) -> ApiResult<(VersionOverview, Vec<VersionDistribution>)>;

	// Exploits
	//**********
	async fn list_exploits(&self, opts: &ListExploitOptions) -> ApiResult<Paginated<Exploit>>;
	async fn read_exploit(&self, id: Uuid) -> ApiResult<Exploit>;
	async fn create_exploit(&self, created_by: Uuid, data: &CreateExploit) -> ApiResult<Exploit>;
	async fn update_exploit(&self, id: Uuid, data: &UpdateExploit) -> ApiResult<Exploit>;
	async fn delete_exploit(&self, id: Uuid) -> ApiResult<()>;

	// Reports
	//*********
	async fn create_report(&self, user_id: Option<Uuid>, data: &CreateReport) -> ApiResult<Report>;
	async fn set_report_analysis(&self, id: Uuid, analysis: &str) -> ApiResult<()>;
	async fn list_reports(&self, opts: &ListReportOptions) -> ApiResult<Paginated<Report>>;
	async fn read_report(&self, id: Uuid) -> ApiResult<Report>;
	async fn update_report_status(
		&self,
		id: Uuid,
		status: ReportStatus,
		admin_notes: Option<&str>,
	) -> ApiResult<Report>;
	async fn report_stats(&self) -> ApiResult<(ReportOverview, Vec<ReportTimelineEntry>)>;

	// Chat
	//******
	async fn create_chat_session(
		&self,
		user_id: Option<Uuid>,
		session_name: Option<&str>,
	) -> ApiResult<ChatSession>;
	async fn list_chat_sessions(&self, user_id: Option<Uuid>) -> ApiResult<Vec<ChatSessionSummary>>;
	async fn read_chat_session(&self, id: Uuid) -> ApiResult<ChatSession>;
	async fn list_chat_messages(
		&self,
		session_id: Uuid,
		limit: i64,
		offset: i64,
	) -> ApiResult<Vec<ChatMessage>>;
	/// The `limit` newest messages, newest first
	async fn list_recent_chat_messages(
		&self,
		session_id: Uuid,
		limit: i64,
	) -> ApiResult<Vec<ChatMessage>>;
	async fn create_chat_message(
		&self,
		session_id: Uuid,
		role: ChatRole,
		content: &str,
		metadata: Option<&Value>,
	) -> ApiResult<ChatMessage>;
	/// Bump the session's updated_at
	async fn touch_chat_session(&self, id: Uuid) -> ApiResult<()>;
	/// Delete a session owned by `user_id` (messages cascade)
	async fn delete_chat_session(&self, id: Uuid, user_id: Option<Uuid>) -> ApiResult<()>;

	// System log
	//************
	async fn write_log(&self, level: &str, message: &str, context: Option<&Value>) -> ApiResult<()>;
	async fn list_logs(&self, opts: &ListLogOptions) -> ApiResult<Paginated<SystemLog>>;

	// Admin
	//*******
	async fn admin_stats(&self) -> ApiResult<(AdminOverview, Vec<ActivityItem>)>;
	async fn list_training_data(
		&self,
		page: i64,
		limit: i64,
		validated_only: bool,
	) -> ApiResult<Paginated<TrainingData>>;
	async fn set_training_validated(&self, id: Uuid, is_validated: bool) -> ApiResult<TrainingData>;
}

// vim: ts=4
