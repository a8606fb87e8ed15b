use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// A comment row as stored in the `comments` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i32,
    pub text: String,
    pub date_posted: DateTime<Utc>,
    pub user_id: i32,
    pub post_id: i32,
}

/// A comment with its author's name, as shown under a post.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentView {
    pub id: i32,
    pub text: String,
    pub date_posted: DateTime<Utc>,
    pub user_id: i32,
    pub author_username: String,
    pub author_image_file: String,
}

/// Body of `POST /create_comment/<post_id>`. A missing field counts as empty.
#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// Who may delete a comment: its author and the author of the post it sits under.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CommentOwnership {
    pub id: i32,
    pub user_id: i32,
    pub post_author_id: i32,
}

impl CommentOwnership {
    pub fn can_delete(&self, user_id: i32) -> bool {
        self.user_id == user_id || self.post_author_id == user_id
    }
}

impl Comment {
    pub async fn for_post(pool: &PgPool, post_id: i32) -> Result<Vec<CommentView>, sqlx::Error> {
        sqlx::query_as::<_, CommentView>(
            "SELECT cm.id, cm.text, cm.date_posted, cm.user_id, \
             u.username AS author_username, u.image_file AS author_image_file \
             FROM comments cm JOIN users u ON u.id = cm.user_id \
             WHERE cm.post_id = $1 ORDER BY cm.date_posted, cm.id",
        )
        .bind(post_id)
        .fetch_all(pool)
        .await
    }

    pub async fn ownership(
        pool: &PgPool,
        comment_id: i32,
    ) -> Result<Option<CommentOwnership>, sqlx::Error> {
        sqlx::query_as::<_, CommentOwnership>(
            "SELECT cm.id, cm.user_id, p.user_id AS post_author_id \
             FROM comments cm JOIN posts p ON p.id = cm.post_id \
             WHERE cm.id = $1",
        )
        .bind(comment_id)
        .fetch_optional(pool)
        .await
    }
}
