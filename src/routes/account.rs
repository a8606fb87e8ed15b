use crate::{
    auth::AuthenticatedUserId,
    config::Config,
    error::AppError,
    flash::Flash,
    models::{ActivityUpdate, Page, PageQuery, PostFilter, PostSummary, UpdateAccountForm, User, UserProfile},
    pictures::{remove_picture, save_picture, MAX_PICTURE_BYTES},
    routes::posts::load_page,
};
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Responder};
use futures::StreamExt;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

/// Context of a user's public page.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountPage {
    pub title: String,
    pub user: UserProfile,
    pub posts: Page<PostSummary>,
}

/// A user's profile with their posts, newest first.
#[get("/account/{user_id}")]
pub async fn account(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    path: web::Path<i32>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let user = User::find(&pool, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let posts = load_page(&pool, PostFilter::ByAuthor(user.id), &query, config.posts_per_page).await?;

    Ok(HttpResponse::Ok().json(AccountPage {
        title: "Account".into(),
        user: UserProfile::from(user),
        posts,
    }))
}

/// Prefilled account form.
#[get("/update_account")]
pub async fn update_account_form(
    user_id: AuthenticatedUserId,
    pool: web::Data<PgPool>,
) -> Result<impl Responder, AppError> {
    let user = User::current(&pool, user_id.0).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "title": "Account",
        "user": UserProfile::from(user),
    })))
}

struct UploadedPicture {
    filename: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct AccountUpload {
    username: Option<String>,
    email: Option<String>,
    picture: Option<UploadedPicture>,
}

/// Text fields are small; only the picture may approach the upload cap.
const MAX_TEXT_FIELD_BYTES: usize = 4 * 1024;

impl AccountUpload {
    async fn read(mut payload: Multipart) -> Result<Self, AppError> {
        let mut upload = AccountUpload::default();

        while let Some(item) = payload.next().await {
            let mut field = item?;
            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(|f| f.to_string());
            let limit = if name == "picture" { MAX_PICTURE_BYTES } else { MAX_TEXT_FIELD_BYTES };

            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk?;
                if data.len() + chunk.len() > limit {
                    return Err(AppError::PayloadTooLarge(format!(
                        "Field '{}' exceeds {} bytes",
                        name, limit
                    )));
                }
                data.extend_from_slice(&chunk);
            }

            match name.as_str() {
                "username" => upload.username = Some(text_field(&name, data)?),
                "email" => upload.email = Some(text_field(&name, data)?),
                "picture" => {
                    // Browsers send an empty part when no file was chosen.
                    if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                        if !data.is_empty() {
                            upload.picture = Some(UploadedPicture { filename, bytes: data });
                        }
                    }
                }
                other => debug!("ignoring multipart field {}", other),
            }
        }

        Ok(upload)
    }
}

fn text_field(name: &str, data: Vec<u8>) -> Result<String, AppError> {
    String::from_utf8(data)
        .map(|s| s.trim().to_string())
        .map_err(|_| AppError::BadRequest(format!("Field '{}' is not valid UTF-8", name)))
}

/// Writes the new account fields and settles the picture files.
///
/// On success the replaced picture is deleted; if the update fails, a freshly
/// stored picture is deleted instead so it does not linger in the upload dir.
async fn persist_account(
    pool: &PgPool,
    upload_dir: &str,
    user: &User,
    form: &UpdateAccountForm,
    image_file: &str,
) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET username = $1, email = $2, image_file = $3 WHERE id = $4")
        .bind(&form.username)
        .bind(&form.email)
        .bind(image_file)
        .bind(user.id)
        .execute(pool)
        .await;

    let picture_changed = image_file != user.image_file;
    match result {
        Ok(_) => {
            if picture_changed {
                remove_picture(upload_dir, &user.image_file).await;
            }
            Ok(())
        }
        Err(e) => {
            if picture_changed {
                remove_picture(upload_dir, image_file).await;
            }
            Err(e.into())
        }
    }
}

/// Update the logged-in user's name, email and (optionally) picture
///
/// Expects `multipart/form-data` with `username`, `email` and an optional `picture` file.
#[post("/update_account")]
pub async fn update_account(
    user_id: AuthenticatedUserId,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let user = User::current(&pool, user_id.0).await?;
    let upload = AccountUpload::read(payload).await?;

    let form = UpdateAccountForm {
        username: upload.username.unwrap_or_default(),
        email: upload.email.unwrap_or_default(),
    };
    form.validate()?;

    if let Some(clash) = User::taken_fields(&pool, &form.username, &form.email, Some(user.id)).await? {
        return Err(AppError::BadRequest(clash.into()));
    }

    let image_file = match upload.picture {
        Some(picture) => save_picture(&config.upload_dir, &picture.filename, picture.bytes).await?,
        None => user.image_file.clone(),
    };

    persist_account(&pool, &config.upload_dir, &user, &form, &image_file).await?;

    info!("user {} updated their account", user.id);
    Ok(Flash::success("Your account has been updated!", format!("/account/{}", user.id)).respond())
}

/// Records the client-reported time of the user's last activity.
#[post("/update_activity")]
pub async fn update_activity(
    user_id: AuthenticatedUserId,
    pool: web::Data<PgPool>,
    body: web::Json<ActivityUpdate>,
) -> Result<HttpResponse, AppError> {
    let last_activity = body.timestamp()?;

    let result = sqlx::query("UPDATE users SET last_activity = $1 WHERE id = $2")
        .bind(last_activity)
        .bind(user_id.0)
        .execute(&**pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::Unauthorized("Please log in to access this page.".into()));
    }

    debug!("user {} active at {}", user_id.0, last_activity);
    Ok(HttpResponse::Ok().body("OK"))
}
