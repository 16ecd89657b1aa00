use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;

lazy_static! {
    // Stand-in hash checked when the username is unknown, at the same cost as real ones.
    static ref DUMMY_HASH: Option<String> = hash("dummy-password-never-matches", DEFAULT_COST).ok();
}

/// Salted bcrypt hash of `password` at the library's default cost.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(hash(password, DEFAULT_COST)?)
}

/// `Err` only when `hashed_password` is not a bcrypt string.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    Ok(verify(password, hashed_password)?)
}

/// Spends the same bcrypt work as `verify_password` for an account that does
/// not exist. Always returns `false`.
pub fn verify_unknown_user(password: &str) -> bool {
    if let Some(dummy) = DUMMY_HASH.as_deref() {
        let _ = verify(password, dummy);
    }
    false
}
