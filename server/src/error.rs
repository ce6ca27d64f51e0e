use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use tracing::error;

pub type ApiResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Missing or malformed request data (HTTP 400)
	Validation(Box<str>),
	/// Missing or invalid credentials (HTTP 401)
	Unauthorized,
	/// Authenticated but not allowed (HTTP 403)
	PermissionDenied,
	/// HTTP 404 with an entity-specific message
	NotFound(Box<str>),
	/// Uniqueness violation (HTTP 409)
	Conflict(Box<str>),
	/// Database failure, detail stays server-side
	DbError,
	/// AI gateway failure, detail stays server-side
	AiError,
	/// Startup misconfiguration, never produced while serving
	Config(&'static str),

	// externals
	Io(std::io::Error),
}

impl Error {
	pub fn validation(msg: impl Into<Box<str>>) -> Self {
		Self::Validation(msg.into())
	}

	pub fn not_found(msg: impl Into<Box<str>>) -> Self {
		Self::NotFound(msg.into())
	}

	pub fn conflict(msg: impl Into<Box<str>>) -> Self {
		Self::Conflict(msg.into())
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::Validation(msg) => write!(f, "validation: {}", msg),
			Error::Unauthorized => write!(f, "unauthorized"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::NotFound(msg) => write!(f, "not found: {}", msg),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::DbError => write!(f, "database error"),
			Error::AiError => write!(f, "ai gateway error"),
			Error::Config(msg) => write!(f, "configuration: {}", msg),
			Error::Io(err) => write!(f, "io: {}", err),
		}
	}
}

impl std::error::Error for Error {}

/// Central error translation: every handler failure becomes the same JSON
/// shape. Internal failures are redacted; their detail only reaches the log.
impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let (status, error, message) = match self {
			Error::Validation(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg),
			Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", "Authentication required".into()),
			Error::PermissionDenied => (StatusCode::FORBIDDEN, "Forbidden", "Access denied".into()),
			Error::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", msg),
			Error::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", msg),
			Error::DbError | Error::AiError | Error::Config(_) => (
				StatusCode::INTERNAL_SERVER_ERROR,
				"Internal Server Error",
				"An unexpected error occurred".into(),
			),
			Error::Io(err) => {
				error!("io error: {}", err);
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					"Internal Server Error",
					"An unexpected error occurred".into(),
				)
			}
		};

		(status, Json(json!({ "error": error, "message": message }))).into_response()
	}
}

// vim: ts=4
