use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

/// A post row as stored in the `posts` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
    /// Author.
    pub user_id: i32,
    pub category_id: i32,
}

/// Fields of the create/update post form.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[validate(length(min = 3, max = 100))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    /// Name of one of the seeded categories.
    #[validate(length(min = 1))]
    pub category: String,
}

/// Body of `POST /search`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SearchForm {
    #[validate(length(min = 1))]
    pub searched: String,
}

/// A post joined with the author and category names, as listed on every page.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostSummary {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
    pub user_id: i32,
    pub author_username: String,
    pub author_image_file: String,
    pub category_id: i32,
    pub category_name: String,
}

const SUMMARY_SELECT: &str = "SELECT p.id, p.title, p.content, p.date_posted, p.user_id, \
     u.username AS author_username, u.image_file AS author_image_file, \
     p.category_id, c.name AS category_name \
     FROM posts p \
     JOIN users u ON u.id = p.user_id \
     JOIN categories c ON c.id = p.category_id";

/// Which posts a paginated listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    ByAuthor(i32),
    InCategory(i32),
}

impl PostFilter {
    fn condition(&self) -> Option<(&'static str, i32)> {
        match self {
            PostFilter::All => None,
            PostFilter::ByAuthor(user_id) => Some(("p.user_id = $1", *user_id)),
            PostFilter::InCategory(category_id) => Some(("p.category_id = $1", *category_id)),
        }
    }
}

impl Post {
    pub async fn find(pool: &PgPool, id: i32) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            "SELECT id, title, content, date_posted, user_id, category_id FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

impl PostSummary {
    pub async fn find(pool: &PgPool, id: i32) -> Result<Option<PostSummary>, sqlx::Error> {
        sqlx::query_as::<_, PostSummary>(&format!("{} WHERE p.id = $1", SUMMARY_SELECT))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Newest-first slice of the posts matching `filter`, with the total match count.
    pub async fn page(
        pool: &PgPool,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PostSummary>, i64), sqlx::Error> {
        let (rows, total) = match filter.condition() {
            Some((condition, id)) => {
                let sql = format!(
                    "{} WHERE {} ORDER BY p.date_posted DESC, p.id DESC LIMIT $2 OFFSET $3",
                    SUMMARY_SELECT, condition
                );
                let rows = sqlx::query_as::<_, PostSummary>(&sql)
                    .bind(id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await?;
                let total = sqlx::query_scalar::<_, i64>(&format!(
                    "SELECT COUNT(*) FROM posts p WHERE {}",
                    condition
                ))
                .bind(id)
                .fetch_one(pool)
                .await?;
                (rows, total)
            }
            None => {
                let sql = format!(
                    "{} ORDER BY p.date_posted DESC, p.id DESC LIMIT $1 OFFSET $2",
                    SUMMARY_SELECT
                );
                let rows = sqlx::query_as::<_, PostSummary>(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await?;
                let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
                    .fetch_one(pool)
                    .await?;
                (rows, total)
            }
        };
        Ok((rows, total))
    }

    /// Posts whose content contains `term`, case-insensitively, ordered by title.
    pub async fn search(pool: &PgPool, term: &str) -> Result<Vec<PostSummary>, sqlx::Error> {
        sqlx::query_as::<_, PostSummary>(&format!(
            "{} WHERE p.content ILIKE $1 ESCAPE '\\' ORDER BY p.title, p.id",
            SUMMARY_SELECT
        ))
        .bind(like_pattern(term))
        .fetch_all(pool)
        .await
    }
}

/// Turns user input into a `%term%` pattern with LIKE wildcards taken literally.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
