//! App state type

use std::{net::SocketAddr, sync::Arc};

use crate::core::rate_limit::{RateLimitConfig, RateLimiter};
use crate::prelude::*;
use crate::types::VERSION;

use crate::ai_adapter::AiAdapter;
use crate::auth_adapter::AuthAdapter;
use crate::meta_adapter::MetaAdapter;

use crate::routes;

pub struct AppState {
	pub opts: AppBuilderOpts,
	pub rate_limiter: Arc<RateLimiter>,

	pub auth_adapter: Arc<dyn AuthAdapter>,
	pub meta_adapter: Arc<dyn MetaAdapter>,
	pub ai_adapter: Arc<dyn AiAdapter>,
}

pub type App = Arc<AppState>;

pub struct Adapters {
	pub auth_adapter: Option<Arc<dyn AuthAdapter>>,
	pub meta_adapter: Option<Arc<dyn MetaAdapter>>,
	pub ai_adapter: Option<Arc<dyn AiAdapter>>,
}

#[derive(Debug)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	pub cors_origin: Box<str>,
	pub rate_limit: RateLimitConfig,
}

pub struct AppBuilder {
	opts: AppBuilderOpts,
	adapters: Adapters,
}

impl AppBuilder {
	pub fn new() -> Self {
		AppBuilder {
			opts: AppBuilderOpts {
				listen: "127.0.0.1:3001".into(),
				cors_origin: "http://localhost:5173".into(),
				rate_limit: RateLimitConfig::default(),
			},
			adapters: Adapters {
				auth_adapter: None,
				meta_adapter: None,
				ai_adapter: None,
			},
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self { self.opts.listen = listen.into(); self }
	pub fn cors_origin(&mut self, cors_origin: impl Into<Box<str>>) -> &mut Self { self.opts.cors_origin = cors_origin.into(); self }
	pub fn rate_limit(&mut self, rate_limit: RateLimitConfig) -> &mut Self { self.opts.rate_limit = rate_limit; self }

	// Adapters
	pub fn auth_adapter(&mut self, auth_adapter: Arc<dyn AuthAdapter>) -> &mut Self { self.adapters.auth_adapter = Some(auth_adapter); self }
	pub fn meta_adapter(&mut self, meta_adapter: Arc<dyn MetaAdapter>) -> &mut Self { self.adapters.meta_adapter = Some(meta_adapter); self }
	pub fn ai_adapter(&mut self, ai_adapter: Arc<dyn AiAdapter>) -> &mut Self { self.adapters.ai_adapter = Some(ai_adapter); self }

	/// Assemble the shared state without binding a socket. Used by `run` and
	/// by tests that drive the router directly.
	pub fn build(self) -> ApiResult<App> {
		let auth_adapter = self.adapters.auth_adapter.ok_or(Error::Config("no auth adapter"))?;
		let meta_adapter = self.adapters.meta_adapter.ok_or(Error::Config("no meta adapter"))?;
		let ai_adapter = self.adapters.ai_adapter.ok_or(Error::Config("no ai adapter"))?;
		let rate_limiter = Arc::new(RateLimiter::new(self.opts.rate_limit.clone()));

		Ok(Arc::new(AppState {
			opts: self.opts,
			rate_limiter,
			auth_adapter,
			meta_adapter,
			ai_adapter,
		}))
	}

	pub async fn run(self) -> ApiResult<()> {
		tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.init();
		info!("Kaji vulnerability database V{}", VERSION);

		let app = self.build()?;

		match app.meta_adapter.check().await {
			Ok(()) => info!("Database connection OK"),
			Err(err) => warn!("Database check failed at startup: {}", err),
		}

		let router = routes::init(app.clone());

		let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await?;
		info!("Listening on {}", app.opts.listen);
		info!(
			"Rate limit: {} requests / {}ms",
			app.opts.rate_limit.max_requests,
			app.opts.rate_limit.window.as_millis()
		);

		axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
			.with_graceful_shutdown(shutdown_signal())
			.await?;

		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self { Self::new() }
}

async fn shutdown_signal() {
	let ctrl_c = async {
		let _ = tokio::signal::ctrl_c().await;
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut sig) => { sig.recv().await; }
			Err(_) => std::future::pending().await,
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
	info!("Shutting down");
}

// vim: ts=4
