//! Database schema initialization
//!
//! Creates every table and index if missing. Statements are idempotent so
//! startup against an existing database is a no-op.

use sqlx::PgPool;

pub(crate) async fn init_db(db: &PgPool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	sqlx::query("CREATE EXTENSION IF NOT EXISTS pgcrypto").execute(&mut *tx).await?;

	// Users
	//*******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS users (
		id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
		username text NOT NULL UNIQUE,
		email text NOT NULL UNIQUE,
		password_hash text NOT NULL,
		role text NOT NULL DEFAULT 'user',
		is_active boolean NOT NULL DEFAULT true,
		created_at timestamptz NOT NULL DEFAULT now(),
		updated_at timestamptz NOT NULL DEFAULT now()
	)",
	)
	.execute(&mut *tx)
	.await?;

	// OS versions
	//*************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS os_versions (
		id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
		version text NOT NULL UNIQUE,
		build_number text,
		release_date date,
		end_of_life_date date,
		is_stable boolean NOT NULL DEFAULT true,
		is_current boolean NOT NULL DEFAULT false,
		created_at timestamptz NOT NULL DEFAULT now(),
		updated_at timestamptz NOT NULL DEFAULT now()
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS vulnerability_categories (
		id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
		name text NOT NULL UNIQUE,
		description text,
		created_at timestamptz NOT NULL DEFAULT now()
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Exploits
	//**********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS exploits (
		id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
		cve_id text,
		title text NOT NULL,
		description text NOT NULL,
		severity text NOT NULL,
		cvss_score double precision,
		category_id uuid REFERENCES vulnerability_categories(id),
		os_version_id uuid NOT NULL REFERENCES os_versions(id),
		discovered_date date,
		disclosed_date date,
		patched_date date,
		exploit_code text,
		proof_of_concept text,
		refs jsonb,
		tags text[],
		is_verified boolean NOT NULL DEFAULT false,
		is_public boolean NOT NULL DEFAULT false,
		created_by uuid REFERENCES users(id),
		created_at timestamptz NOT NULL DEFAULT now(),
		updated_at timestamptz NOT NULL DEFAULT now()
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_exploits_version ON exploits(os_version_id)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_exploits_severity ON exploits(severity)")
		.execute(&mut *tx)
		.await?;

	// Reports
	//*********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS user_reports (
		id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
		user_id uuid REFERENCES users(id),
		report_type text NOT NULL,
		title text NOT NULL,
		description text NOT NULL,
		exploit_id uuid REFERENCES exploits(id),
		os_version_id uuid REFERENCES os_versions(id),
		status text NOT NULL DEFAULT 'pending',
		ai_analysis text,
		admin_notes text,
		created_at timestamptz NOT NULL DEFAULT now(),
		updated_at timestamptz NOT NULL DEFAULT now()
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_status ON user_reports(status)")
		.execute(&mut *tx)
		.await?;

	// Chat
	//******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS chat_sessions (
		id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
		user_id uuid REFERENCES users(id),
		session_name text,
		created_at timestamptz NOT NULL DEFAULT now(),
		updated_at timestamptz NOT NULL DEFAULT now()
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS chat_messages (
		id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
		session_id uuid NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
		role text NOT NULL,
		content text NOT NULL,
		metadata jsonb,
		created_at timestamptz NOT NULL DEFAULT now()
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_chat_messages_session ON chat_messages(session_id)")
		.execute(&mut *tx)
		.await?;

	// System log
	//************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS system_logs (
		id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
		level text NOT NULL,
		message text NOT NULL,
		context jsonb,
		created_at timestamptz NOT NULL DEFAULT now()
	)",
	)
	.execute(&mut *tx)
	.await?;

	// AI training data
	//******************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS ai_training_data (
		id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
		exploit_id uuid NOT NULL REFERENCES exploits(id) ON DELETE CASCADE,
		training_prompt text NOT NULL,
		ai_response text NOT NULL,
		model_version text,
		confidence_score double precision,
		is_validated boolean NOT NULL DEFAULT false,
		created_at timestamptz NOT NULL DEFAULT now()
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await
}

// vim: ts=4
