use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// What a signed token may be used for.
///
/// A token minted for one purpose is rejected everywhere else, so a leaked
/// reset link cannot be replayed as a login session and vice versa.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Carried in the `session` cookie after login.
    Session,
    /// Embedded in the link of a password-reset email.
    PasswordReset,
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: i32,
    /// Expiration timestamp (seconds since epoch) for the token.
    pub exp: usize,
    pub purpose: TokenPurpose,
}

/// Signs a token for `user_id` that expires `ttl_secs` seconds from now.
///
/// # Returns
/// A `Result` containing the JWT string if successful.
/// Returns `AppError::InternalServerError` if the expiry overflows or encoding fails.
pub fn generate_token(
    user_id: i32,
    purpose: TokenPurpose,
    ttl_secs: i64,
    secret: &str,
) -> Result<String, AppError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::seconds(ttl_secs))
        .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        exp: expiration,
        purpose,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a JWT string and decodes its claims.
///
/// Default validation checks are applied (signature, expiration), then the
/// token's purpose must equal `expected`.
///
/// # Returns
/// Returns `AppError::Unauthorized` if the token is malformed, its signature is invalid,
/// it has expired, or it was issued for another purpose.
pub fn verify_token(token: &str, expected: TokenPurpose, secret: &str) -> Result<Claims, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    if claims.purpose != expected {
        return Err(AppError::Unauthorized(
            "Invalid token: issued for another purpose".into(),
        ));
    }
    Ok(claims)
}
