//! OpenRouter AI adapter
//!
//! Thin chat-completions client behind [`kaji::ai_adapter::AiAdapter`].
//! Responses that should be JSON are parsed leniently: a malformed triage
//! verdict degrades to "not valid" and a malformed hypothesis list to an
//! empty one, because these calls are advisory.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use kaji::{
	ai_adapter::{AiAdapter, ReportValidation},
	error::{ApiResult, Error},
};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "openai/gpt-4o";
const MAX_TOKENS: u32 = 4000;

#[derive(Debug)]
pub struct AiAdapterOpenRouter {
	client: reqwest::Client,
	api_key: Box<str>,
	base_url: Box<str>,
	model: Box<str>,
}

#[derive(Deserialize)]
struct CompletionResponse {
	choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
	message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
	content: String,
}

impl AiAdapterOpenRouter {
	pub fn new(api_key: impl Into<Box<str>>) -> Self {
		Self {
			client: reqwest::Client::new(),
			api_key: api_key.into(),
			base_url: DEFAULT_BASE_URL.into(),
			model: DEFAULT_MODEL.into(),
		}
	}

	pub fn base_url(mut self, base_url: impl Into<Box<str>>) -> Self {
		self.base_url = base_url.into();
		self
	}

	pub fn with_model(mut self, model: impl Into<Box<str>>) -> Self {
		self.model = model.into();
		self
	}

	async fn complete(
		&self,
		system: &str,
		user: &str,
		temperature: f64,
	) -> ApiResult<Box<str>> {
		let body = json!({
			"model": self.model,
			"messages": [
				{ "role": "system", "content": system },
				{ "role": "user", "content": user },
			],
			"temperature": temperature,
			"max_tokens": MAX_TOKENS,
			"stream": false,
		});

		let res = self
			.client
			.post(format!("{}/chat/completions", self.base_url))
			.bearer_auth(self.api_key.as_ref())
			.json(&body)
			.send()
			.await
			.map_err(|err| {
				error!("OpenRouter request failed: {}", err);
				Error::AiError
			})?
			.error_for_status()
			.map_err(|err| {
				error!("OpenRouter returned an error status: {}", err);
				Error::AiError
			})?;

		let completion: CompletionResponse = res.json().await.map_err(|err| {
			error!("OpenRouter response could not be decoded: {}", err);
			Error::AiError
		})?;

		completion
			.choices
			.into_iter()
			.next()
			.map(|choice| choice.message.content.into())
			.ok_or(Error::AiError)
	}
}

/// Strip a markdown code fence if the model wrapped its JSON in one
fn json_payload(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(inner) = trimmed.strip_prefix("```") else { return trimmed };
	let inner = inner.strip_prefix("json").unwrap_or(inner);
	inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[async_trait]
impl AiAdapter for AiAdapterOpenRouter {
	async fn answer_question(&self, question: &str, context: &Value) -> ApiResult<Box<str>> {
		let system = "You are Kaji, an AI assistant specializing in OS security research and \
			vulnerability analysis. You have access to a comprehensive database of exploits and \
			vulnerabilities. Always provide accurate, helpful, and detailed responses. If you're \
			unsure about something, say so and suggest where the user might find more information.";
		let user = format!(
			"User Question: {}\n\nContext: {}\n\nPlease provide a comprehensive and helpful response.",
			question,
			serde_json::to_string_pretty(context).unwrap_or_default(),
		);

		self.complete(system, &user, 0.7).await
	}

	async fn validate_report(
		&self,
		report: &str,
		exploit_id: Option<&str>,
	) -> ApiResult<ReportValidation> {
		let system = "You are Kaji, an OS security expert responsible for validating user reports.";
		let related = exploit_id
			.map(|id| format!("\nRelated Exploit ID: {}", id))
			.unwrap_or_default();
		let user = format!(
			"A user has submitted a report about a potential error or new vulnerability.\n\n\
			Report: {}{}\n\n\
			Analyze the report: is it a valid security concern, is the information accurate, \
			what is the severity if valid, and what actions should be taken?\n\n\
			Respond in JSON format:\n\
			{{ \"isValid\": true/false, \"analysis\": \"detailed analysis\", \"confidence\": 0.0-1.0 }}",
			report, related,
		);

		let content = self.complete(system, &user, 0.4).await?;

		match serde_json::from_str(json_payload(&content)) {
			Ok(validation) => Ok(validation),
			Err(err) => {
				error!("Failed to parse validation response: {}", err);
				Ok(ReportValidation {
					is_valid: false,
					analysis: "Unable to parse AI validation response".into(),
					confidence: 0.0,
				})
			}
		}
	}

	async fn find_new_vulnerabilities(
		&self,
		version: &str,
		existing: &[Box<str>],
	) -> ApiResult<Vec<Box<str>>> {
		let system = "You are Kaji, an expert OS security researcher with deep knowledge of \
			system internals.";
		let user = format!(
			"OS Version: {}\nExisting Exploits: {}\n\n\
			Based on your knowledge of the platform architecture and the existing \
			vulnerabilities, suggest potential new attack vectors that might exist in this \
			version. Provide 5-10 specific, actionable vulnerability hypotheses with brief \
			explanations of why they might exist.\n\n\
			Format as a JSON array of strings:\n[\"hypothesis1\", \"hypothesis2\", ...]",
			version,
			existing.join(", "),
		);

		let content = self.complete(system, &user, 0.8).await?;

		match serde_json::from_str(json_payload(&content)) {
			Ok(hypotheses) => Ok(hypotheses),
			Err(err) => {
				error!("Failed to parse vulnerability hypotheses: {}", err);
				Ok(Vec::new())
			}
		}
	}

	fn model(&self) -> &str {
		&self.model
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn json_payload_unwraps_code_fences() {
		assert_eq!(json_payload("[\"a\"]"), "[\"a\"]");
		assert_eq!(json_payload("```json\n[\"a\"]\n```"), "[\"a\"]");
		assert_eq!(json_payload("```\n{\"x\":1}\n```"), "{\"x\":1}");
	}

	#[test]
	fn validation_json_uses_camel_case() {
		let parsed: ReportValidation =
			serde_json::from_str(r#"{"isValid":true,"analysis":"ok","confidence":0.9}"#).unwrap();
		assert!(parsed.is_valid);
		assert_eq!(parsed.confidence, 0.9);
	}
}

// vim: ts=4
