pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use lazy_static::lazy_static;
use serde::Deserialize;
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedUserId;
pub use middleware::{SessionMiddleware, SESSION_COOKIE};
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims, TokenPurpose};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    pub(crate) static ref USERNAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Fields of the login form.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Fields of the sign-up form.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    /// Between 2 and 20 characters: letters, digits, underscores or hyphens.
    #[validate(
        length(min = 2, max = 20),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email, length(max = 120))]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(must_match = "password")]
    pub confirm_password: String,
}

/// Asks for a password-reset mail to be sent to `email`.
#[derive(Debug, Deserialize, Validate)]
pub struct RequestResetForm {
    #[validate(email)]
    pub email: String,
}

/// The new password chosen from a reset link.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordForm {
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(must_match = "password")]
    pub confirm_password: String,
}

/// Builds the HttpOnly cookie that carries a freshly issued session token.
pub fn session_cookie(token: String, ttl_hours: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(ttl_hours))
        .finish()
}

/// A cookie that makes the browser drop its session.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}
