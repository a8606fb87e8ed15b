use std::env;
use std::str::FromStr;

use crate::error::AppError;

/// SMTP settings for the password-reset mailer.
///
/// An empty `server` puts the mailer in no-op mode.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub default_sender: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub server_port: u16,
    pub server_host: String,
    pub public_url: String,
    pub upload_dir: String,
    pub posts_per_page: i64,
    pub session_ttl_hours: i64,
    pub reset_token_ttl_secs: i64,
    pub mail: MailSettings,
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::InternalServerError(format!("{} must be set", key)))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match optional(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::InternalServerError(format!("{} must be a valid value", key))),
        None => Ok(default),
    }
}

fn positive(key: &str, default: i64) -> Result<i64, AppError> {
    let value = parsed(key, default)?;
    if value < 1 {
        return Err(AppError::InternalServerError(format!("{} must be at least 1", key)));
    }
    Ok(value)
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: 587,
            use_tls: true,
            username: None,
            password: None,
            default_sender: "noreply@quillpress.local".to_string(),
        }
    }
}

impl Config {
    /// Builds a configuration with every optional setting at its default.
    pub fn new(database_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            secret_key: secret_key.into(),
            server_port: 8080,
            server_host: "127.0.0.1".to_string(),
            public_url: "http://127.0.0.1:8080".to_string(),
            upload_dir: "static/images".to_string(),
            posts_per_page: 3,
            session_ttl_hours: 24,
            reset_token_ttl_secs: 1800,
            mail: MailSettings::default(),
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::new(required("DATABASE_URL")?, required("SECRET_KEY")?);
        let mail_defaults = MailSettings::default();

        let server_host = optional("SERVER_HOST").unwrap_or(defaults.server_host);
        let server_port = parsed("SERVER_PORT", defaults.server_port)?;
        let public_url = optional("PUBLIC_URL")
            .unwrap_or_else(|| format!("http://{}:{}", server_host, server_port));

        Ok(Self {
            database_url: defaults.database_url,
            secret_key: defaults.secret_key,
            server_port,
            server_host,
            public_url: public_url.trim_end_matches('/').to_string(),
            upload_dir: optional("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            posts_per_page: positive("POSTS_PER_PAGE", defaults.posts_per_page)?,
            session_ttl_hours: positive("SESSION_TTL_HOURS", defaults.session_ttl_hours)?,
            reset_token_ttl_secs: positive("RESET_TOKEN_TTL_SECS", defaults.reset_token_ttl_secs)?,
            mail: MailSettings {
                server: optional("MAIL_SERVER").unwrap_or(mail_defaults.server),
                port: parsed("MAIL_PORT", mail_defaults.port)?,
                use_tls: parsed("MAIL_USE_TLS", mail_defaults.use_tls)?,
                username: optional("MAIL_USERNAME"),
                password: optional("MAIL_PASSWORD"),
                default_sender: optional("MAIL_DEFAULT_SENDER")
                    .unwrap_or(mail_defaults.default_sender),
            },
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
