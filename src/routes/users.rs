use crate::{
    auth::{
        generate_token, hash_password, removal_cookie, session_cookie, verify_password,
        AuthenticatedUserId, LoginForm, RegisterForm, TokenPurpose,
    },
    config::Config,
    error::AppError,
    flash::Flash,
    models::User,
};
use actix_web::{get, http::StatusCode, post, web, HttpResponse, Responder};
use log::{info, warn};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

pub const LOGIN_FAILED: &str = "Login Unsuccessful. Check your email and password";

/// Sign-up page.
#[get("/register")]
pub async fn register_form() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "title": "Register",
        "fields": ["username", "email", "password", "confirm_password"]
    }))
}

/// Register a new user
///
/// Creates the account and sends the visitor on to the login page.
/// Duplicate usernames or emails are rejected with 400.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    form.validate()?;

    if let Some(clash) = User::taken_fields(&pool, &form.username, &form.email, None).await? {
        return Err(AppError::BadRequest(clash.into()));
    }

    let password_hash = hash_password(&form.password)?;

    let user_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&form.username)
    .bind(&form.email)
    .bind(password_hash)
    .fetch_one(&**pool)
    .await?;

    info!("registered user {} ({})", user_id, form.username);
    Ok(Flash::success("You have just been registered!", "/login").respond())
}

/// Login page.
#[get("/login")]
pub async fn login_form() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "title": "LogIn",
        "fields": ["email", "password"]
    }))
}

/// Login user
///
/// Checks the credentials and stores a signed session token in the `session` cookie.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    form.validate()?;

    let user = User::find_by_email(&pool, &form.email).await?;
    let authenticated = match &user {
        Some(user) => verify_password(&form.password, &user.password_hash)?,
        None => false,
    };

    match user {
        Some(user) if authenticated => {
            let token = generate_token(
                user.id,
                TokenPurpose::Session,
                config.session_ttl_hours * 3600,
                &config.secret_key,
            )?;
            info!("user {} logged in", user.id);
            Ok(Flash::success("You have just been logged in!", "/")
                .respond_with_cookie(session_cookie(token, config.session_ttl_hours)))
        }
        _ => {
            warn!("failed login attempt for {}", form.email);
            Ok(Flash::danger(LOGIN_FAILED, "/login").respond_with_status(StatusCode::UNAUTHORIZED))
        }
    }
}

/// Ends the session by expiring the cookie.
#[get("/logout")]
pub async fn logout(user_id: AuthenticatedUserId) -> impl Responder {
    info!("user {} logged out", user_id.0);
    Flash::info("You have been logged out.", "/").respond_with_cookie(removal_cookie())
}
