//! Tower layer enforcing the per-client request budget
//!
//! Sits between CORS and the body size limit in the middleware stack, so
//! rejected requests never reach body buffering or a handler. Every response
//! that passes through, allowed or not, carries the `X-RateLimit-*` headers.

use axum::{
	extract::ConnectInfo,
	http::Request,
	response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::{
	net::SocketAddr,
	sync::Arc,
	task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::warn;

use super::{
	error::{apply_status_headers, RateLimitError},
	limiter::{Decision, RateLimiter, UNKNOWN_CLIENT},
};

#[derive(Clone)]
pub struct RateLimitLayer {
	limiter: Arc<RateLimiter>,
}

impl RateLimitLayer {
	pub fn new(limiter: Arc<RateLimiter>) -> Self {
		Self { limiter }
	}
}

impl<S> Layer<S> for RateLimitLayer {
	type Service = RateLimitService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		RateLimitService { inner, limiter: self.limiter.clone() }
	}
}

#[derive(Clone)]
pub struct RateLimitService<S> {
	inner: S,
	limiter: Arc<RateLimiter>,
}

impl<S, B> Service<Request<B>> for RateLimitService<S>
where
	S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
	S::Future: Send + 'static,
	B: Send + 'static,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<B>) -> Self::Future {
		let key = client_key(&req);

		match self.limiter.check(&key) {
			Decision::Allowed(status) => {
				// take the ready inner service, leave the clone behind
				let clone = self.inner.clone();
				let mut inner = std::mem::replace(&mut self.inner, clone);
				Box::pin(async move {
					let mut res = inner.call(req).await?;
					apply_status_headers(res.headers_mut(), &status);
					Ok(res)
				})
			}
			Decision::Limited { status, retry_after_secs } => {
				warn!(client = %key, path = %req.uri().path(), "rate limit exceeded");
				let res = RateLimitError { status, retry_after_secs }.into_response();
				Box::pin(async move { Ok(res) })
			}
		}
	}
}

/// Resolve the client key from the peer address recorded at accept time
fn client_key<B>(req: &Request<B>) -> Box<str> {
	req.extensions()
		.get::<ConnectInfo<SocketAddr>>()
		.map(|ConnectInfo(addr)| addr.ip().to_string().into_boxed_str())
		.unwrap_or_else(|| UNKNOWN_CLIENT.into())
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::Body;

	#[test]
	fn key_falls_back_when_peer_address_is_missing() {
		let req = Request::builder().uri("/").body(Body::empty()).unwrap();
		assert_eq!(&*client_key(&req), UNKNOWN_CLIENT);
	}

	#[test]
	fn key_is_the_peer_ip_without_port() {
		let addr: SocketAddr = "203.0.113.7:51000".parse().unwrap();
		let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
		req.extensions_mut().insert(ConnectInfo(addr));
		assert_eq!(&*client_key(&req), "203.0.113.7");
	}
}

// vim: ts=4
