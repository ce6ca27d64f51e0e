//! AI completion gateway interface
//!
//! The gateway is an opaque HTTP collaborator: prompts in, text out. The
//! trait keeps handlers testable without network access.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Debug;

use crate::error::ApiResult;

/// AI verdict on a user-submitted report
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportValidation {
	pub is_valid: bool,
	pub analysis: Box<str>,
	pub confidence: f64,
}

#[async_trait]
pub trait AiAdapter: Send + Sync + Debug {
	/// Answer a free-form user question with optional structured context
	/// (conversation history, related exploit data)
	async fn answer_question(&self, question: &str, context: &Value) -> ApiResult<Box<str>>;

	/// Triage a user report; failures here must never fail the request that
	/// triggered the triage
	async fn validate_report(&self, report: &str, exploit_id: Option<&str>) -> ApiResult<ReportValidation>;

	/// Hypothesize not-yet-catalogued attack vectors for a release
	async fn find_new_vulnerabilities(
		&self,
		version: &str,
		existing: &[Box<str>],
	) -> ApiResult<Vec<Box<str>>>;

	/// Model identifier recorded into message metadata
	fn model(&self) -> &str;
}

// vim: ts=4
