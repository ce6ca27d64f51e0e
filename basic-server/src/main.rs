use std::{env, process, sync::Arc};

use kaji::core::rate_limit::RateLimitConfig;
use kaji::AppBuilder;
use kaji_ai_adapter_openrouter::AiAdapterOpenRouter;
use kaji_auth_adapter_postgres::AuthAdapterPostgres;
use kaji_meta_adapter_postgres::MetaAdapterPostgres;

#[tokio::main]
async fn main() {
	let Ok(database_url) = env::var("DATABASE_URL") else {
		eprintln!("FATAL: DATABASE_URL is required");
		process::exit(1);
	};
	let Ok(api_key) = env::var("OPENROUTER_API_KEY") else {
		eprintln!("FATAL: OPENROUTER_API_KEY is required");
		process::exit(1);
	};

	let port = env::var("PORT").unwrap_or("3001".into());
	let jwt_secret = env::var("JWT_SECRET").unwrap_or("fallback-secret".into());
	let cors_origin = env::var("CORS_ORIGIN").unwrap_or("http://localhost:5173".into());

	let auth_adapter = AuthAdapterPostgres::new(&database_url, jwt_secret)
		.await
		.unwrap_or_else(|err| {
			eprintln!("FATAL: auth adapter init failed: {}", err);
			process::exit(1);
		});
	let meta_adapter = MetaAdapterPostgres::new(&database_url).await.unwrap_or_else(|err| {
		eprintln!("FATAL: meta adapter init failed: {}", err);
		process::exit(1);
	});

	let mut ai_adapter = AiAdapterOpenRouter::new(api_key);
	if let Ok(base_url) = env::var("OPENROUTER_BASE_URL") {
		ai_adapter = ai_adapter.base_url(base_url);
	}
	if let Ok(model) = env::var("OPENROUTER_MODEL") {
		ai_adapter = ai_adapter.with_model(model);
	}

	let mut builder = AppBuilder::new();
	builder
		.listen(format!("0.0.0.0:{}", port))
		.cors_origin(cors_origin)
		.rate_limit(RateLimitConfig::from_env())
		.auth_adapter(Arc::new(auth_adapter))
		.meta_adapter(Arc::new(meta_adapter))
		.ai_adapter(Arc::new(ai_adapter));

	if let Err(err) = builder.run().await {
		eprintln!("FATAL: {}", err);
		process::exit(1);
	}
}

// vim: ts=4
