//! Custom middlewares

use axum::{
	body::Body,
	extract::State,
	http::{header, response::Response, Request},
	middleware::Next,
};

use crate::core::Auth;
use crate::prelude::*;

fn bearer_token(req: &Request<Body>) -> Option<&str> {
	let auth_header = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
	auth_header.strip_prefix("Bearer ").map(str::trim)
}

pub async fn require_auth(State(state): State<App>, mut req: Request<Body>, next: Next) -> ApiResult<Response<Body>> {
	let token = bearer_token(&req).ok_or(Error::Unauthorized)?;
	let ctx = state.auth_adapter.validate_token(token).await?;

	req.extensions_mut().insert(Auth(ctx));

	Ok(next.run(req).await)
}

/// Decode the token when present, stay anonymous otherwise. An invalid token
/// is still a hard 401 so callers notice expired credentials.
pub async fn optional_auth(State(state): State<App>, mut req: Request<Body>, next: Next) -> ApiResult<Response<Body>> {
	if let Some(token) = bearer_token(&req) {
		let ctx = state.auth_adapter.validate_token(token).await?;
		req.extensions_mut().insert(Auth(ctx));
	}

	Ok(next.run(req).await)
}

/// Researcher or admin
pub async fn require_researcher(State(state): State<App>, mut req: Request<Body>, next: Next) -> ApiResult<Response<Body>> {
	let token = bearer_token(&req).ok_or(Error::Unauthorized)?;
	let ctx = state.auth_adapter.validate_token(token).await?;

	if ctx.role < Role::Researcher {
		return Err(Error::PermissionDenied);
	}

	req.extensions_mut().insert(Auth(ctx));

	Ok(next.run(req).await)
}

pub async fn require_admin(State(state): State<App>, mut req: Request<Body>, next: Next) -> ApiResult<Response<Body>> {
	let token = bearer_token(&req).ok_or(Error::Unauthorized)?;
	let ctx = state.auth_adapter.validate_token(token).await?;

	if ctx.role != Role::Admin {
		return Err(Error::PermissionDenied);
	}

	req.extensions_mut().insert(Auth(ctx));

	Ok(next.run(req).await)
}

// vim: ts=4
