//! Password hashing
//!
//! bcrypt at cost 12 takes long enough to stall an async worker, so both
//! hash and verify run on the blocking pool.

use kaji::prelude::*;

const BCRYPT_COST: u32 = 12;

pub(crate) async fn generate_password_hash(password: Box<str>) -> ApiResult<Box<str>> {
	tokio::task::spawn_blocking(move || {
		bcrypt::hash(password.as_ref(), BCRYPT_COST)
			.map(Into::into)
			.map_err(|_| Error::Unauthorized)
	})
	.await
	.map_err(|_| Error::Unauthorized)?
}

pub(crate) async fn check_password(password: Box<str>, password_hash: Box<str>) -> ApiResult<()> {
	tokio::task::spawn_blocking(move || {
		match bcrypt::verify(password.as_ref(), &password_hash) {
			Ok(true) => Ok(()),
			_ => Err(Error::Unauthorized),
		}
	})
	.await
	.map_err(|_| Error::Unauthorized)?
}

#[cfg(test)]
mod tests {
	#[tokio::test]
	async fn hash_and_verify_round_trip() {
		// low cost to keep the test fast
		let hash = bcrypt::hash("hunter2", 4).unwrap();
		assert!(bcrypt::verify("hunter2", &hash).unwrap());
		assert!(!bcrypt::verify("hunter3", &hash).unwrap());
	}
}

// vim: ts=4
