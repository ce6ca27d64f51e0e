use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Role //
//******//
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Researcher,
	Admin,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::User => "user",
			Role::Researcher => "researcher",
			Role::Admin => "admin",
		}
	}

	pub fn is_admin(&self) -> bool {
		matches!(self, Role::Admin)
	}
}

impl std::str::FromStr for Role {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"user" => Ok(Role::User),
			"researcher" => Ok(Role::Researcher),
			"admin" => Ok(Role::Admin),
			_ => Err(Error::validation(format!("unknown role: {}", s))),
		}
	}
}

// Severity //
//**********//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Critical,
	High,
	Medium,
	Low,
	Info,
}

impl Severity {
	pub fn as_str(&self) -> &'static str {
		match self {
			Severity::Critical => "critical",
			Severity::High => "high",
			Severity::Medium => "medium",
			Severity::Low => "low",
			Severity::Info => "info",
		}
	}
}

impl std::str::FromStr for Severity {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"critical" => Ok(Severity::Critical),
			"high" => Ok(Severity::High),
			"medium" => Ok(Severity::Medium),
			"low" => Ok(Severity::Low),
			"info" => Ok(Severity::Info),
			_ => Err(Error::validation(format!("unknown severity: {}", s))),
		}
	}
}

// Report enums //
//**************//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
	Error,
	FalsePositive,
	MissingExploit,
	Suggestion,
}

impl ReportType {
	pub fn as_str(&self) -> &'static str {
		match self {
			ReportType::Error => "error",
			ReportType::FalsePositive => "false_positive",
			ReportType::MissingExploit => "missing_exploit",
			ReportType::Suggestion => "suggestion",
		}
	}
}

impl std::str::FromStr for ReportType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"error" => Ok(ReportType::Error),
			"false_positive" => Ok(ReportType::FalsePositive),
			"missing_exploit" => Ok(ReportType::MissingExploit),
			"suggestion" => Ok(ReportType::Suggestion),
			_ => Err(Error::validation(format!("unknown report type: {}", s))),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
	Pending,
	Reviewing,
	Accepted,
	Rejected,
}

impl ReportStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			ReportStatus::Pending => "pending",
			ReportStatus::Reviewing => "reviewing",
			ReportStatus::Accepted => "accepted",
			ReportStatus::Rejected => "rejected",
		}
	}
}

impl std::str::FromStr for ReportStatus {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(ReportStatus::Pending),
			"reviewing" => Ok(ReportStatus::Reviewing),
			"accepted" => Ok(ReportStatus::Accepted),
			"rejected" => Ok(ReportStatus::Rejected),
			_ => Err(Error::validation(format!("unknown report status: {}", s))),
		}
	}
}

// Chat //
//******//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
	User,
	Assistant,
	System,
}

impl ChatRole {
	pub fn as_str(&self) -> &'static str {
		match self {
			ChatRole::User => "user",
			ChatRole::Assistant => "assistant",
			ChatRole::System => "system",
		}
	}
}

impl std::str::FromStr for ChatRole {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"user" => Ok(ChatRole::User),
			"assistant" => Ok(ChatRole::Assistant),
			"system" => Ok(ChatRole::System),
			_ => Err(Error::validation(format!("unknown chat role: {}", s))),
		}
	}
}

// User //
//******//
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
	pub id: Uuid,
	pub username: Box<str>,
	pub email: Box<str>,
	pub role: Role,
	pub is_active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

// Pagination //
//************//
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Pagination {
	pub page: i64,
	pub limit: i64,
	pub total: i64,
	pub pages: i64,
}

impl Pagination {
	pub fn new(page: i64, limit: i64, total: i64) -> Self {
		let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
		Self { page, limit, total, pages }
	}
}

/// Standard paginated list envelope
#[derive(Clone, Debug, Serialize)]
pub struct Paginated<T> {
	pub items: Vec<T>,
	pub pagination: Pagination,
}

impl<T> Paginated<T> {
	pub fn new(items: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
		Self { items, pagination: Pagination::new(page, limit, total) }
	}
}

// Query structs keep `page`/`limit` as plain fields: axum's `Query` cannot
// deserialize numbers through `#[serde(flatten)]`, every value arrives as a
// string there.
pub fn default_page() -> i64 {
	1
}

pub fn default_limit() -> i64 {
	20
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pagination_rounds_up() {
		let p = Pagination::new(1, 20, 41);
		assert_eq!(p.pages, 3);
		assert_eq!(Pagination::new(1, 20, 40).pages, 2);
		assert_eq!(Pagination::new(1, 20, 0).pages, 0);
	}

	#[test]
	fn role_ordering_follows_ladder() {
		assert!(Role::Admin > Role::Researcher);
		assert!(Role::Researcher > Role::User);
	}

	#[test]
	fn enums_round_trip_as_str() {
		for s in ["critical", "high", "medium", "low", "info"] {
			let sev: Severity = s.parse().unwrap();
			assert_eq!(sev.as_str(), s);
		}
		for s in ["error", "false_positive", "missing_exploit", "suggestion"] {
			let t: ReportType = s.parse().unwrap();
			assert_eq!(t.as_str(), s);
		}
	}
}

// vim: ts=4
