//! AI chat endpoints
//!
//! Sessions may belong to a user or be anonymous. A message post stores the
//! user's message, assembles recent conversation (and optionally exploit
//! data) as context, asks the AI gateway, and stores the assistant reply.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::OptionalAuth;
use crate::meta_adapter::{ChatMessage, ChatSession, ChatSessionSummary};
use crate::prelude::*;
use crate::types::ChatRole;

/// Messages pulled into the AI context window per question
const CONTEXT_MESSAGES: i64 = 10;

const SUGGESTIONS: [&str; 10] = [
	"What are the most critical vulnerabilities right now?",
	"How can I protect my device?",
	"What's the latest security update?",
	"Explain this exploit in simple terms",
	"What are the CVSS scores for recent vulnerabilities?",
	"How do I report a security issue?",
	"What's the difference between these vulnerability types?",
	"Show me vulnerabilities for the current OS version",
	"What are the mitigation strategies for this exploit?",
	"How often should I update my system?",
];

/// # POST /api/v1/chat/sessions
#[derive(Deserialize)]
pub struct CreateSessionReq {
	session_name: Option<Box<str>>,
}

pub async fn post_session(
	State(app): State<App>,
	OptionalAuth(auth): OptionalAuth,
	Json(req): Json<CreateSessionReq>,
) -> ApiResult<(StatusCode, Json<ChatSession>)> {
	let user_id = auth.as_ref().map(|a| a.user_id);
	let session = app
		.meta_adapter
		.create_chat_session(user_id, req.session_name.as_deref())
		.await?;

	Ok((StatusCode::CREATED, Json(session)))
}

/// # GET /api/v1/chat/sessions
pub async fn get_sessions(
	State(app): State<App>,
	OptionalAuth(auth): OptionalAuth,
) -> ApiResult<Json<Vec<ChatSessionSummary>>> {
	let user_id = auth.as_ref().map(|a| a.user_id);
	let sessions = app.meta_adapter.list_chat_sessions(user_id).await?;
	Ok(Json(sessions))
}

/// # GET /api/v1/chat/sessions/{id}/messages
#[derive(Deserialize)]
pub struct ListMessagesQuery {
	#[serde(default = "default_message_limit")]
	limit: i64,
	#[serde(default)]
	offset: i64,
}

fn default_message_limit() -> i64 {
	50
}

pub async fn get_messages(
	State(app): State<App>,
	Path(session_id): Path<Uuid>,
	Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
	let messages = app
		.meta_adapter
		.list_chat_messages(session_id, query.limit, query.offset)
		.await?;
	Ok(Json(messages))
}

/// # POST /api/v1/chat/sessions/{id}/messages
#[derive(Deserialize)]
pub struct PostMessageReq {
	message: Box<str>,
	context: Option<Value>,
}

#[derive(Serialize)]
pub struct PostMessageRes {
	user_message: ChatMessage,
	ai_message: ChatMessage,
}

pub async fn post_message(
	State(app): State<App>,
	OptionalAuth(auth): OptionalAuth,
	Path(session_id): Path<Uuid>,
	Json(req): Json<PostMessageReq>,
) -> ApiResult<Json<PostMessageRes>> {
	if req.message.trim().is_empty() {
		return Err(Error::validation("Message is required"));
	}

	// 404 before anything is written
	app.meta_adapter.read_chat_session(session_id).await?;

	let user_message = app
		.meta_adapter
		.create_chat_message(session_id, ChatRole::User, &req.message, req.context.as_ref())
		.await?;

	let context = build_context(&app, session_id, req.context.as_ref()).await?;
	let answer = app.ai_adapter.answer_question(&req.message, &context).await?;

	let metadata = json!({
		"model": app.ai_adapter.model(),
		"timestamp": Utc::now().to_rfc3339(),
	});
	let ai_message = app
		.meta_adapter
		.create_chat_message(session_id, ChatRole::Assistant, &answer, Some(&metadata))
		.await?;

	app.meta_adapter.touch_chat_session(session_id).await?;

	info!(
		session_id = %session_id,
		user_id = ?auth.as_ref().map(|a| a.user_id),
		message_length = req.message.len(),
		response_length = answer.len(),
		"Chat message processed"
	);

	Ok(Json(PostMessageRes { user_message, ai_message }))
}

/// Recent conversation oldest-first, plus full exploit data when the client
/// pinned one in its context.
async fn build_context(app: &App, session_id: Uuid, client_context: Option<&Value>) -> ApiResult<Value> {
	// fetched newest-first, flipped so the conversation reads oldest-first
	let mut recent = app
		.meta_adapter
		.list_recent_chat_messages(session_id, CONTEXT_MESSAGES)
		.await?;
	recent.reverse();
	let conversation: Vec<Value> = recent
		.iter()
		.map(|m| json!({ "role": m.role, "content": m.content }))
		.collect();

	let mut context = json!({ "conversation": conversation });

	let exploit_id = client_context
		.and_then(|c| c.get("exploit_id"))
		.and_then(|v| v.as_str())
		.and_then(|s| Uuid::parse_str(s).ok());
	if let Some(exploit_id) = exploit_id {
		if let Ok(exploit) = app.meta_adapter.read_exploit(exploit_id).await {
			context["exploit"] = serde_json::to_value(&exploit).unwrap_or(Value::Null);
		}
	}

	Ok(context)
}

/// # DELETE /api/v1/chat/sessions/{id}
pub async fn delete_session(
	State(app): State<App>,
	OptionalAuth(auth): OptionalAuth,
	Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
	let user_id = auth.as_ref().map(|a| a.user_id);
	app.meta_adapter.delete_chat_session(session_id, user_id).await?;

	info!(session_id = %session_id, user_id = ?user_id, "Chat session deleted");

	Ok(StatusCode::NO_CONTENT)
}

/// # POST /api/v1/chat/suggestions
#[derive(Deserialize)]
pub struct SuggestionsReq {
	query: Option<Box<str>>,
}

#[derive(Serialize)]
pub struct SuggestionsRes {
	suggestions: Vec<&'static str>,
}

pub async fn post_suggestions(Json(req): Json<SuggestionsReq>) -> Json<SuggestionsRes> {
	let needle = req.query.as_deref().unwrap_or("").to_lowercase();
	let suggestions = SUGGESTIONS
		.iter()
		.copied()
		.filter(|s| needle.is_empty() || s.to_lowercase().contains(&needle))
		.take(5)
		.collect();

	Json(SuggestionsRes { suggestions })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn suggestions_filter_is_case_insensitive() {
		let needle = "cvss";
		let hits: Vec<_> = SUGGESTIONS
			.iter()
			.filter(|s| s.to_lowercase().contains(needle))
			.collect();
		assert_eq!(hits.len(), 1);
	}

	#[test]
	fn suggestions_cap_at_five() {
		let all: Vec<_> = SUGGESTIONS.iter().take(5).collect();
		assert_eq!(all.len(), 5);
		assert!(SUGGESTIONS.len() > 5);
	}
}

// vim: ts=4
