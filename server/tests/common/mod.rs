//! Shared test fixtures: an app wired to in-memory mock adapters
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use kaji::auth_adapter::{AuthAdapter, AuthCtx, AuthLogin};
use kaji::ai_adapter::{AiAdapter, ReportValidation};
use kaji::core::rate_limit::RateLimitConfig;
use kaji::error::{ApiResult, Error};
use kaji::meta_adapter::*;
use kaji::types::{ChatRole, Paginated, ReportStatus, Role, User};
use kaji::AppBuilder;

pub const USER_TOKEN: &str = "token-zelda";
pub const ADMIN_TOKEN: &str = "token-admin";

pub fn user_id() -> Uuid {
	Uuid::from_u128(0x1001)
}

pub fn admin_id() -> Uuid {
	Uuid::from_u128(0x1002)
}

fn fixture_user(id: Uuid, username: &str, role: Role) -> User {
	User {
		id,
		username: username.into(),
		email: format!("{}@example.com", username).into(),
		role,
		is_active: true,
		created_at: Utc::now(),
		updated_at: Utc::now(),
	}
}

// MockAuthAdapter //
//*****************//
#[derive(Debug, Default)]
pub struct MockAuthAdapter {
	registered: Mutex<HashSet<Box<str>>>,
}

#[async_trait]
impl AuthAdapter for MockAuthAdapter {
	async fn create_user(&self, username: &str, email: &str, _password: &str) -> ApiResult<User> {
		let mut registered = self.registered.lock();
		if !registered.insert(username.into()) {
			return Err(Error::conflict("Username or email already exists"));
		}
		let mut user = fixture_user(Uuid::new_v4(), username, Role::User);
		user.email = email.into();
		Ok(user)
	}

	async fn check_password(&self, username: &str, password: &str) -> ApiResult<AuthLogin> {
		if username == "zelda" && password == "hunter2" {
			Ok(AuthLogin {
				user: fixture_user(user_id(), "zelda", Role::User),
				token: USER_TOKEN.into(),
			})
		} else {
			Err(Error::Unauthorized)
		}
	}

	async fn change_password(&self, _user_id: Uuid, current: &str, _new: &str) -> ApiResult<()> {
		if current == "hunter2" { Ok(()) } else { Err(Error::Unauthorized) }
	}

	async fn validate_token(&self, token: &str) -> ApiResult<AuthCtx> {
		match token {
			USER_TOKEN => Ok(AuthCtx { user_id: user_id(), username: "zelda".into(), role: Role::User }),
			ADMIN_TOKEN => Ok(AuthCtx { user_id: admin_id(), username: "impa".into(), role: Role::Admin }),
			_ => Err(Error::Unauthorized),
		}
	}
}

// MockMetaAdapter //
//*****************//
#[derive(Debug, Default)]
pub struct MockMetaAdapter {
	pub reports: Mutex<Vec<Report>>,
	pub analyses: Mutex<Vec<(Uuid, Box<str>)>>,
	pub logs: Mutex<Vec<(Box<str>, Box<str>)>>,
	pub sessions: Mutex<Vec<ChatSession>>,
	/// insertion order is chronological
	pub messages: Mutex<Vec<ChatMessage>>,
}

#[async_trait]
impl MetaAdapter for MockMetaAdapter {
	async fn check(&self) -> ApiResult<()> {
		Ok(())
	}

	async fn read_user(&self, id: Uuid) -> ApiResult<User> {
		if id == user_id() {
			Ok(fixture_user(id, "zelda", Role::User))
		} else if id == admin_id() {
			Ok(fixture_user(id, "impa", Role::Admin))
		} else {
			Err(Error::not_found("User not found"))
		}
	}

	async fn update_user_email(&self, id: Uuid, email: &str) -> ApiResult<User> {
		let mut user = self.read_user(id).await?;
		user.email = email.into();
		Ok(user)
	}

	async fn read_user_stats(&self, _id: Uuid) -> ApiResult<UserStats> {
		Ok(UserStats {
			exploits_created: 2,
			reports_submitted: 1,
			chat_sessions: 0,
			accepted_reports: 1,
		})
	}

	async fn list_users(&self, opts: &ListUserOptions) -> ApiResult<Paginated<AdminUser>> {
		let users = vec![AdminUser {
			user: fixture_user(user_id(), "zelda", Role::User),
			exploits_created: 2,
			reports_submitted: 1,
		}];
		Ok(Paginated::new(users, opts.page, opts.limit, 1))
	}

	async fn update_user_role(&self, id: Uuid, role: Role) -> ApiResult<User> {
		let mut user = self.read_user(id).await?;
		user.role = role;
		Ok(user)
	}

	async fn list_versions(&self, _current_only: bool) -> ApiResult<Vec<VersionWithCounts>> {
		Ok(Vec::new())
	}

	async fn read_version(&self, _id: Uuid) -> ApiResult<VersionWithCounts> {
		Err(Error::not_found("OS version not found"))
	}

	async fn create_version(&self, data: &CreateVersion) -> ApiResult<OsVersion> {
		Ok(OsVersion {
			id: Uuid::new_v4(),
			version: data.version.clone(),
			build_number: data.build_number.clone(),
			release_date: data.release_date,
			end_of_life_date: data.end_of_life_date,
			is_stable: data.is_stable,
			is_current: false,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		})
	}

	async fn update_version(&self, _id: Uuid, _data: &UpdateVersion) -> ApiResult<OsVersion> {
		Err(Error::not_found("OS version not found"))
	}

	async fn set_current_version(&self, _id: Uuid) -> ApiResult<()> {
		Err(Error::not_found("OS version not found"))
	}

	async fn version_stats(&self) -> ApiResult<(VersionOverview, Vec<VersionDistribution>)> {
		Ok((
			VersionOverview {
				total_versions: 0,
				current_versions: 0,
				stable_versions: 0,
				eol_versions: 0,
				recent_versions: 0,
			},
			Vec::new(),
		))
	}

	async fn list_exploits(&self, opts: &ListExploitOptions) -> ApiResult<Paginated<Exploit>> {
		Ok(Paginated::new(Vec::new(), opts.page, opts.limit, 0))
	}

	async fn read_exploit(&self, _id: Uuid) -> ApiResult<Exploit> {
		Err(Error::not_found("Exploit not found"))
	}

	async fn create_exploit(&self, _created_by: Uuid, _data: &CreateExploit) -> ApiResult<Exploit> {
		Err(Error::DbError)
	}

	async fn update_exploit(&self, _id: Uuid, _data: &UpdateExploit) -> ApiResult<Exploit> {
		Err(Error::not_found("Exploit not found"))
	}

	async fn delete_exploit(&self, _id: Uuid) -> ApiResult<()> {
		Err(Error::not_found("Exploit not found"))
	}

	async fn create_report(&self, user_id: Option<Uuid>, data: &CreateReport) -> ApiResult<Report> {
		let report = Report {
			id: Uuid::new_v4(),
			user_id,
			username: None,
			report_type: data.report_type,
			title: data.title.clone(),
			description: data.description.clone(),
			exploit_id: data.exploit_id,
			exploit_title: None,
			os_version_id: data.os_version_id,
			os_version: None,
			status: ReportStatus::Pending,
			ai_analysis: None,
			admin_notes: None,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		};
		self.reports.lock().push(report.clone());
		Ok(report)
	}

	async fn set_report_analysis(&self, id: Uuid, analysis: &str) -> ApiResult<()> {
		self.analyses.lock().push((id, analysis.into()));
		Ok(())
	}

	async fn list_reports(&self, opts: &ListReportOptions) -> ApiResult<Paginated<Report>> {
		let reports = self.reports.lock().clone();
		let total = reports.len() as i64;
		Ok(Paginated::new(reports, opts.page, opts.limit, total))
	}

	async fn read_report(&self, id: Uuid) -> ApiResult<Report> {
		self.reports
			.lock()
			.iter()
			.find(|r| r.id == id)
			.cloned()
			.ok_or_else(|| Error::not_found("Report not found"))
	}

	async fn update_report_status(
		&self,
		id: Uuid,
		status: ReportStatus,
		admin_notes: Option<&str>,
	) -> ApiResult<Report> {
		let mut reports = self.reports.lock();
		let report = reports
			.iter_mut()
			.find(|r| r.id == id)
			.ok_or_else(|| Error::not_found("Report not found"))?;
		report.status = status;
		report.admin_notes = admin_notes.map(Into::into);
		Ok(report.clone())
	}

	async fn report_stats(&self) -> ApiResult<(ReportOverview, Vec<ReportTimelineEntry>)> {
		Ok((
			ReportOverview {
				total_reports: self.reports.lock().len() as i64,
				pending_count: 0,
				reviewing_count: 0,
				accepted_count: 0,
				rejected_count: 0,
				recent_reports: 0,
			},
			Vec::new(),
		))
	}

	async fn create_chat_session(
		&self,
		user_id: Option<Uuid>,
		session_name: Option<&str>,
	) -> ApiResult<ChatSession> {
		let session = ChatSession {
			id: Uuid::new_v4(),
			user_id,
			session_name: session_name.map(Into::into),
			created_at: Utc::now(),
			updated_at: Utc::now(),
		};
		self.sessions.lock().push(session.clone());
		Ok(session)
	}

	async fn list_chat_sessions(&self, _user_id: Option<Uuid>) -> ApiResult<Vec<ChatSessionSummary>> {
		Ok(Vec::new())
	}

	async fn read_chat_session(&self, id: Uuid) -> ApiResult<ChatSession> {
		self.sessions
			.lock()
			.iter()
			.find(|s| s.id == id)
			.cloned()
			.ok_or_else(|| Error::not_found("Chat session not found"))
	}

	async fn list_chat_messages(
		&self,
		session_id: Uuid,
		limit: i64,
		offset: i64,
	) -> ApiResult<Vec<ChatMessage>> {
		Ok(self
			.messages
			.lock()
			.iter()
			.filter(|m| m.session_id == session_id)
			.skip(offset as usize)
			.take(limit as usize)
			.cloned()
			.collect())
	}

	async fn list_recent_chat_messages(
		&self,
		session_id: Uuid,
		limit: i64,
	) -> ApiResult<Vec<ChatMessage>> {
		let mut newest: Vec<ChatMessage> = self
			.messages
			.lock()
			.iter()
			.filter(|m| m.session_id == session_id)
			.rev()
			.take(limit as usize)
			.cloned()
			.collect();
		newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(newest)
	}

	async fn create_chat_message(
		&self,
		session_id: Uuid,
		role: ChatRole,
		content: &str,
		metadata: Option<&Value>,
	) -> ApiResult<ChatMessage> {
		let message = ChatMessage {
			id: Uuid::new_v4(),
			session_id,
			role,
			content: content.into(),
			metadata: metadata.cloned(),
			created_at: Utc::now(),
		};
		self.messages.lock().push(message.clone());
		Ok(message)
	}

	async fn touch_chat_session(&self, _id: Uuid) -> ApiResult<()> {
		Ok(())
	}

	async fn delete_chat_session(&self, id: Uuid, user_id: Option<Uuid>) -> ApiResult<()> {
		let mut sessions = self.sessions.lock();
		let before = sessions.len();
		sessions.retain(|s| !(s.id == id && s.user_id == user_id));
		if sessions.len() == before {
			return Err(Error::not_found("Chat session not found or access denied"));
		}
		Ok(())
	}

	async fn write_log(&self, level: &str, message: &str, _context: Option<&Value>) -> ApiResult<()> {
		self.logs.lock().push((level.into(), message.into()));
		Ok(())
	}

	async fn list_logs(&self, opts: &ListLogOptions) -> ApiResult<Paginated<SystemLog>> {
		Ok(Paginated::new(Vec::new(), opts.page, opts.limit, 0))
	}

	async fn admin_stats(&self) -> ApiResult<(AdminOverview, Vec<ActivityItem>)> {
		Ok((
			AdminOverview {
				total_users: 2,
				total_exploits: 0,
				total_reports: self.reports.lock().len() as i64,
				total_chat_sessions: 0,
				total_versions: 0,
				total_training_data: 0,
				recent_errors: 0,
			},
			Vec::new(),
		))
	}

	async fn list_training_data(
		&self,
		page: i64,
		limit: i64,
		_validated_only: bool,
	) -> ApiResult<Paginated<TrainingData>> {
		Ok(Paginated::new(Vec::new(), page, limit, 0))
	}

	async fn set_training_validated(&self, _id: Uuid, _is_validated: bool) -> ApiResult<TrainingData> {
		Err(Error::not_found("Training data not found"))
	}
}

// MockAiAdapter //
//***************//
#[derive(Debug, Default)]
pub struct MockAiAdapter {
	pub fail: bool,
	/// context passed to each `answer_question` call
	pub contexts: Mutex<Vec<Value>>,
}

#[async_trait]
impl AiAdapter for MockAiAdapter {
	async fn answer_question(&self, _question: &str, context: &Value) -> ApiResult<Box<str>> {
		if self.fail {
			return Err(Error::AiError);
		}
		self.contexts.lock().push(context.clone());
		Ok("Stay patched.".into())
	}

	async fn validate_report(
		&self,
		_report: &str,
		_exploit_id: Option<&str>,
	) -> ApiResult<ReportValidation> {
		if self.fail {
			Err(Error::AiError)
		} else {
			Ok(ReportValidation { is_valid: true, analysis: "Looks plausible".into(), confidence: 0.8 })
		}
	}

	async fn find_new_vulnerabilities(
		&self,
		_version: &str,
		_existing: &[Box<str>],
	) -> ApiResult<Vec<Box<str>>> {
		if self.fail { Err(Error::AiError) } else { Ok(vec!["kernel UAF in the USB stack".into()]) }
	}

	fn model(&self) -> &str {
		"mock/model"
	}
}

pub struct TestApp {
	pub router: Router,
	pub meta: Arc<MockMetaAdapter>,
	pub ai: Arc<MockAiAdapter>,
}

/// App with the default rate limit config, generous enough for API tests
pub fn test_app() -> TestApp {
	test_app_with(RateLimitConfig::default(), false)
}

pub fn test_app_with(rate_limit: RateLimitConfig, ai_fails: bool) -> TestApp {
	let meta = Arc::new(MockMetaAdapter::default());
	let ai = Arc::new(MockAiAdapter { fail: ai_fails, ..Default::default() });

	let mut builder = AppBuilder::new();
	builder
		.rate_limit(rate_limit)
		.auth_adapter(Arc::new(MockAuthAdapter::default()))
		.meta_adapter(meta.clone())
		.ai_adapter(ai.clone());
	let app = builder.build().expect("test app");

	TestApp { router: kaji::routes::init(app), meta, ai }
}

// vim: ts=4
