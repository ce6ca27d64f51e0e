//! JWT access tokens, HS256 with a shared secret

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};

use kaji::auth_adapter::AccessToken;
use kaji::prelude::*;

/// 7 days, matching the session length clients were built around
const TOKEN_EXPIRY_SECS: u64 = 7 * 24 * 3600;

pub(crate) fn expiry_timestamp() -> u64 {
	let now = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or_default();
	now + TOKEN_EXPIRY_SECS
}

pub(crate) fn generate_access_token(claims: &AccessToken, jwt_secret: &str) -> ApiResult<Box<str>> {
	encode(
		&Header::new(Algorithm::HS256),
		claims,
		&EncodingKey::from_secret(jwt_secret.as_bytes()),
	)
	.map(Into::into)
	.map_err(|_| Error::Unauthorized)
}

pub(crate) fn validate_access_token(token: &str, jwt_secret: &str) -> ApiResult<AccessToken> {
	decode::<AccessToken>(
		token,
		&DecodingKey::from_secret(jwt_secret.as_bytes()),
		&Validation::new(Algorithm::HS256),
	)
	.map(|data| data.claims)
	.map_err(|_| Error::Unauthorized)
}

#[cfg(test)]
mod tests {
	use super::*;
	use kaji::types::Role;
	use uuid::Uuid;

	#[test]
	fn claims_round_trip() {
		let claims = AccessToken {
			sub: Uuid::new_v4(),
			username: "zelda".into(),
			role: Role::Researcher,
			exp: expiry_timestamp(),
		};
		let token = generate_access_token(&claims, "secret").unwrap();
		let decoded = validate_access_token(&token, "secret").unwrap();
		assert_eq!(decoded.sub, claims.sub);
		assert_eq!(&*decoded.username, "zelda");
		assert_eq!(decoded.role, Role::Researcher);
	}

	#[test]
	fn wrong_secret_is_rejected() {
		let claims = AccessToken {
			sub: Uuid::new_v4(),
			username: "zelda".into(),
			role: Role::User,
			exp: expiry_timestamp(),
		};
		let token = generate_access_token(&claims, "secret").unwrap();
		assert!(validate_access_token(&token, "other").is_err());
	}

	#[test]
	fn expired_token_is_rejected() {
		let claims = AccessToken {
			sub: Uuid::new_v4(),
			username: "zelda".into(),
			role: Role::User,
			exp: 1,
		};
		let token = generate_access_token(&claims, "secret").unwrap();
		assert!(validate_access_token(&token, "secret").is_err());
	}
}

// vim: ts=4
