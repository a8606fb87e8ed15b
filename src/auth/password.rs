use crate::error::AppError;
use bcrypt::{hash, verify};

/// bcrypt work factor for stored account passwords.
const HASH_COST: u32 = 12;

/// Hashes a new account password; the result is the 60-character string stored in `users.password_hash`.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, HASH_COST)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
