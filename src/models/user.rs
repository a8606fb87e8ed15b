use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::error::AppError;

/// Filename every new account starts with.
pub const DEFAULT_IMAGE: &str = "default.jpg";

/// URL prefix under which profile pictures are served.
pub const IMAGE_URL_PREFIX: &str = "/static/images";

const USER_COLUMNS: &str = "id, username, email, image_file, password_hash, last_activity";

/// A registered account as stored in the `users` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub image_file: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub last_activity: DateTime<Utc>,
}

/// What the account page shows about a user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub image_file: String,
    pub image_url: String,
    pub last_activity: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        let image_url = user.image_url();
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            image_file: user.image_file,
            image_url,
            last_activity: user.last_activity,
        }
    }
}

impl User {
    pub fn image_url(&self) -> String {
        format!("{}/{}", IMAGE_URL_PREFIX, self.image_file)
    }

    pub async fn find(pool: &PgPool, id: i32) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Loads the logged-in user, treating a session for a deleted account as logged out.
    pub async fn current(pool: &PgPool, id: i32) -> Result<User, AppError> {
        Self::find(pool, id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Please log in to access this page.".into()))
    }

    /// Tells which of `username` / `email` already belong to an account other than `except`.
    pub async fn taken_fields(
        pool: &PgPool,
        username: &str,
        email: &str,
        except: Option<i32>,
    ) -> Result<Option<&'static str>, sqlx::Error> {
        let clash = sqlx::query_as::<_, (String, String)>(
            "SELECT username, email FROM users \
             WHERE (username = $1 OR email = $2) AND ($3::INT IS NULL OR id <> $3) \
             LIMIT 1",
        )
        .bind(username)
        .bind(email)
        .bind(except)
        .fetch_optional(pool)
        .await?;

        Ok(clash.map(|(existing_username, _)| {
            if existing_username == username {
                "This user name is already in use! Please choose a different one."
            } else {
                "This email is already in use! Please choose a different one."
            }
        }))
    }
}

/// Text fields of the account form; the picture travels next to them in the multipart body.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountForm {
    #[validate(
        length(min = 2, max = 20),
        regex(
            path = "crate::auth::USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email, length(max = 120))]
    pub email: String,
}

/// Body of `POST /update_activity`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityUpdate {
    /// Milliseconds since the Unix epoch, as produced by `Date.now()`.
    pub last_activity: i64,
}

impl ActivityUpdate {
    pub fn timestamp(&self) -> Result<DateTime<Utc>, AppError> {
        Utc.timestamp_millis_opt(self.last_activity)
            .single()
            .ok_or_else(|| AppError::ValidationError("last_activity: out of range".into()))
    }
}
