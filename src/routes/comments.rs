use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    flash::Flash,
    models::{Comment, CommentForm, Post},
};
use actix_web::{post, web, HttpResponse};
use log::info;
use sqlx::PgPool;

/// Comment on a post
///
/// Empty comments and unknown posts are reported with a flash message rather than an error.
#[post("/create_comment/{post_id}")]
pub async fn create_comment(
    user_id: AuthenticatedUserId,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let text = form.text.trim();
    if text.is_empty() {
        return Ok(Flash::info("Comment cannot be empty.", "/").respond());
    }

    if Post::find(&pool, post_id).await?.is_none() {
        return Ok(Flash::info("Post does not exist.", "/").respond());
    }

    let comment = sqlx::query_as::<_, Comment>(
        "INSERT INTO comments (text, user_id, post_id) VALUES ($1, $2, $3) \
         RETURNING id, text, date_posted, user_id, post_id",
    )
    .bind(text)
    .bind(user_id.0)
    .bind(post_id)
    .fetch_one(&**pool)
    .await?;

    info!("user {} commented {} on post {}", user_id.0, comment.id, post_id);
    Ok(Flash::success("Comment has been created!", "/").respond())
}

/// Delete a comment. Allowed for its author and for the author of the post.
#[post("/delete_comment/{comment_id}")]
pub async fn delete_comment(
    user_id: AuthenticatedUserId,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let ownership = Comment::ownership(&pool, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Comment does not exist.".into()))?;
    if !ownership.can_delete(user_id.0) {
        return Err(AppError::Forbidden(
            "You do not have permission to delete this comment.".into(),
        ));
    }

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(ownership.id)
        .execute(&**pool)
        .await?;

    info!("user {} deleted comment {}", user_id.0, ownership.id);
    Ok(Flash::success("Comment has been deleted", "/").respond())
}
