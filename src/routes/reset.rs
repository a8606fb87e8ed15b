use crate::{
    auth::{
        generate_token, hash_password, verify_token, AuthenticatedUserId, RequestResetForm,
        ResetPasswordForm, TokenPurpose,
    },
    config::Config,
    error::AppError,
    flash::{redirect, Flash},
    mail::Mailer,
    models::User,
};
use actix_web::{get, post, web, HttpResponse};
use log::{debug, info};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

const INVALID_TOKEN: &str = "That is an invalid or expired token";

/// Resolves a reset token to its account, or `None` when it is bad, expired or orphaned.
async fn reset_target(pool: &PgPool, config: &Config, token: &str) -> Result<Option<User>, AppError> {
    let claims = match verify_token(token, TokenPurpose::PasswordReset, &config.secret_key) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("rejected reset token: {}", e);
            return Ok(None);
        }
    };
    Ok(User::find(pool, claims.sub).await?)
}

/// Form asking for the account email.
#[get("/reset_password")]
pub async fn reset_request_form(current: Option<AuthenticatedUserId>) -> HttpResponse {
    if current.is_some() {
        return redirect("/");
    }
    HttpResponse::Ok().json(json!({
        "title": "Reset Password",
        "fields": ["email"]
    }))
}

/// Request a password reset
///
/// Mails a signed, time-limited link to the account owner.
#[post("/reset_password")]
pub async fn reset_request(
    current: Option<AuthenticatedUserId>,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    mailer: web::Data<Mailer>,
    form: web::Form<RequestResetForm>,
) -> Result<HttpResponse, AppError> {
    if current.is_some() {
        return Ok(redirect("/"));
    }
    form.validate()?;

    let user = User::find_by_email(&pool, &form.email).await?.ok_or_else(|| {
        AppError::ValidationError(
            "email: There is no account with that email. You must register first.".into(),
        )
    })?;

    let token = generate_token(
        user.id,
        TokenPurpose::PasswordReset,
        config.reset_token_ttl_secs,
        &config.secret_key,
    )?;
    mailer.send_reset_email(&user.email, &token).await?;

    info!("password reset requested for user {}", user.id);
    Ok(Flash::info(
        "An email has been sent with instructions to reset your password.",
        "/login",
    )
    .respond())
}

/// New-password form behind a reset link.
#[get("/reset_request/{token}")]
pub async fn reset_token_form(
    current: Option<AuthenticatedUserId>,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    token: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    if current.is_some() {
        return Ok(redirect("/"));
    }
    if reset_target(&pool, &config, &token).await?.is_none() {
        return Ok(Flash::warning(INVALID_TOKEN, "/reset_password").respond());
    }

    Ok(HttpResponse::Ok().json(json!({
        "title": "Reset Password",
        "fields": ["password", "confirm_password"]
    })))
}

/// Set a new password using a reset link.
#[post("/reset_request/{token}")]
pub async fn reset_token(
    current: Option<AuthenticatedUserId>,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    token: web::Path<String>,
    form: web::Form<ResetPasswordForm>,
) -> Result<HttpResponse, AppError> {
    if current.is_some() {
        return Ok(redirect("/"));
    }
    let Some(user) = reset_target(&pool, &config, &token).await? else {
        return Ok(Flash::warning(INVALID_TOKEN, "/reset_password").respond());
    };
    form.validate()?;

    let password_hash = hash_password(&form.password)?;
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(user.id)
        .execute(&**pool)
        .await?;

    info!("user {} reset their password", user.id);
    Ok(Flash::success(
        "Your password has been updated! You are now able to log in",
        "/login",
    )
    .respond())
}
