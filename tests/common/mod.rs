#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{http::header, test, web, App};
use dotenv::dotenv;
use quillpress::auth::{SessionMiddleware, SESSION_COOKIE};
use quillpress::config::Config;
use quillpress::flash::Flash;
use quillpress::mail::Mailer;
use quillpress::routes;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "Password123!";

/// Everything an App under test needs, plus the temp dir backing picture uploads.
pub struct TestContext {
    pub pool: PgPool,
    pub config: Config,
    pub upload_dir: TempDir,
}

impl TestContext {
    fn build(pool: PgPool, database_url: &str) -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let mut config = Config::new(database_url, TEST_SECRET);
        config.upload_dir = upload_dir.path().to_string_lossy().into_owned();
        Self {
            pool,
            config,
            upload_dir,
        }
    }

    /// A context whose pool never connects; for requests rejected before any query.
    pub fn offline() -> Self {
        let url = "postgres://quillpress@127.0.0.1:1/unused";
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy(url)
            .expect("Failed to build lazy pool");
        Self::build(pool, url)
    }

    /// A migrated database from `DATABASE_URL`.
    ///
    /// Tests that call this are `#[ignore]`d; run them with `cargo test -- --ignored`.
    pub async fn database() -> Self {
        dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("Failed to connect to test DB");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");
        Self::build(pool, &url)
    }

    pub fn session_cookie_for(&self, user_id: i32) -> Cookie<'static> {
        let token = quillpress::auth::generate_token(
            user_id,
            quillpress::auth::TokenPurpose::Session,
            3600,
            TEST_SECRET,
        )
        .expect("Failed to sign token");
        Cookie::new(SESSION_COOKIE, token)
    }
}

pub async fn init_app(
    ctx: &TestContext,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    let mailer = Mailer::new(&ctx.config.mail, &ctx.config.public_url).expect("Failed to build mailer");
    test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.config.clone()))
            .app_data(web::Data::new(ctx.pool.clone()))
            .app_data(web::Data::new(mailer))
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(SessionMiddleware)
            .configure(routes::config),
    )
    .await
}

/// A short name that will not collide across test runs. `prefix` must stay under 12 chars.
pub fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub cookie: Cookie<'static>,
}

/// Registers through `POST /register`, logs in through `POST /login` and returns the session.
pub async fn register_and_login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    pool: &PgPool,
    prefix: &str,
) -> TestUser {
    let username = unique(prefix);
    let email = format!("{}@example.com", username);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_form([
            ("username", username.as_str()),
            ("email", email.as_str()),
            ("password", PASSWORD),
            ("confirm_password", PASSWORD),
        ])
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 303, "registration of {} failed", username);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("email", email.as_str()), ("password", PASSWORD)])
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 303, "login of {} failed", username);
    let cookie = session_from(&resp).expect("login did not set a session cookie");

    let id = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(pool)
        .await
        .expect("registered user missing");

    TestUser {
        id,
        username,
        email,
        cookie,
    }
}

pub fn session_from<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.into_owned())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Reads the flash body of a `303` answer.
pub async fn read_flash<B: MessageBody>(resp: ServiceResponse<B>) -> Flash {
    assert_eq!(resp.status(), 303);
    test::read_body_json(resp).await
}

/// Creates a post in the first seeded category and returns its id.
pub async fn create_post(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    pool: &PgPool,
    user: &TestUser,
    title: &str,
    content: &str,
) -> i32 {
    let req = test::TestRequest::post()
        .uri("/create_post")
        .cookie(user.cookie.clone())
        .set_form([("title", title), ("content", content), ("category", "General")])
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 303, "creating post {:?} failed", title);

    sqlx::query_scalar::<_, i32>(
        "SELECT id FROM posts WHERE user_id = $1 AND title = $2 ORDER BY id DESC LIMIT 1",
    )
    .bind(user.id)
    .bind(title)
    .fetch_one(pool)
    .await
    .expect("created post missing")
}

/// A `multipart/form-data` body with text fields and an optional file part.
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> (String, Vec<u8>) {
    let boundary = "quillpress-test-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                boundary, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}
