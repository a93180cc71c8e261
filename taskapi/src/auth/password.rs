use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use uuid::Uuid;

use crate::errors::ApiError;

/// Hash a password into an Argon2id PHC string with a fresh random salt.
///
/// # Errors
///
/// Returns an internal [`ApiError`] if Argon2 rejects its input.
pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|err| ApiError::internal("Failed to hash password", Some(err.to_string())))?;

    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::internal("Failed to hash password", Some(err.to_string())))
}

/// False for a wrong password and for a stored hash that does not parse.
#[must_use]
pub fn verify_password(plain: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    })
}

/// [`hash_password`] on the blocking pool, off the async workers.
///
/// # Errors
///
/// Returns an internal [`ApiError`] if hashing fails or the blocking task
/// does not finish.
pub async fn hash(plain: &str) -> Result<String, ApiError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|err| ApiError::internal("Failed to hash password", Some(err.to_string())))?
}

/// [`verify_password`] on the blocking pool, off the async workers.
///
/// # Errors
///
/// Returns an internal [`ApiError`] if the blocking task does not finish.
pub async fn verify(plain: &str, stored: &str) -> Result<bool, ApiError> {
    let (plain, stored) = (plain.to_owned(), stored.to_owned());
    tokio::task::spawn_blocking(move || verify_password(&plain, &stored))
        .await
        .map_err(|err| ApiError::internal("Failed to verify password", Some(err.to_string())))
}
