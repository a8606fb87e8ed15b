use crate::{
    auth::AuthenticatedUserId,
    config::Config,
    error::AppError,
    flash::Flash,
    models::{
        pagination::offset, Category, Comment, CommentView, Page, PageQuery, Post, PostFilter,
        PostForm, PostSummary, SearchForm,
    },
};
use actix_web::{get, post, web, HttpResponse, Responder};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Context of the home and category pages.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListingPage {
    pub title: String,
    pub posts: Page<PostSummary>,
    pub categories: Vec<Category>,
}

/// Context of a single post page.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostPage {
    pub title: String,
    pub post: PostSummary,
    pub comments: Vec<CommentView>,
}

/// Context of the search results page.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchPage {
    pub title: String,
    pub searched: String,
    pub posts: Vec<PostSummary>,
}

/// Fetches the requested page of a listing.
pub(crate) async fn load_page(
    pool: &PgPool,
    filter: PostFilter,
    query: &PageQuery,
    per_page: i64,
) -> Result<Page<PostSummary>, AppError> {
    let page = query.page();
    let (items, total) = PostSummary::page(pool, filter, per_page, offset(page, per_page)?).await?;
    Page::new(items, page, per_page, total)
}

/// Loads a post for modification, refusing anyone but its author.
async fn authored_post(pool: &PgPool, post_id: i32, user_id: i32) -> Result<Post, AppError> {
    let post = Post::find(pool, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;
    if post.user_id != user_id {
        return Err(AppError::Forbidden(
            "You are not allowed to change this post".into(),
        ));
    }
    Ok(post)
}

async fn chosen_category(pool: &PgPool, name: &str) -> Result<Category, AppError> {
    Category::find_by_name(pool, name)
        .await?
        .ok_or_else(|| AppError::ValidationError("category: Not a valid choice".into()))
}

/// Home page: every post, newest first.
#[get("/")]
pub async fn home(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let posts = load_page(&pool, PostFilter::All, &query, config.posts_per_page).await?;
    let categories = Category::all(&pool).await?;

    Ok(HttpResponse::Ok().json(ListingPage {
        title: "Home".into(),
        posts,
        categories,
    }))
}

/// Empty post form with the category choices.
#[get("/create_post")]
pub async fn create_post_form(
    _user_id: AuthenticatedUserId,
    pool: web::Data<PgPool>,
) -> Result<impl Responder, AppError> {
    let categories = Category::all(&pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "title": "Create Post",
        "legend": "New Post",
        "categories": categories,
    })))
}

/// Create a new post
///
/// The post is authored by the logged-in user and filed under the named category.
#[post("/create_post")]
pub async fn create_post(
    user_id: AuthenticatedUserId,
    pool: web::Data<PgPool>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, AppError> {
    form.validate()?;
    let category = chosen_category(&pool, &form.category).await?;

    let post = sqlx::query_as::<_, Post>(
        "INSERT INTO posts (title, content, user_id, category_id) VALUES ($1, $2, $3, $4) \
         RETURNING id, title, content, date_posted, user_id, category_id",
    )
    .bind(&form.title)
    .bind(&form.content)
    .bind(user_id.0)
    .bind(category.id)
    .fetch_one(&**pool)
    .await?;

    info!("user {} created post {}", user_id.0, post.id);
    Ok(Flash::success("The post has been created!", "/").respond())
}

/// A post with its comments, oldest comment first.
#[get("/post/{post_id}")]
pub async fn show_post(
    path: web::Path<i32>,
    pool: web::Data<PgPool>,
) -> Result<impl Responder, AppError> {
    let post = PostSummary::find(&pool, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;
    let comments = Comment::for_post(&pool, post.id).await?;

    Ok(HttpResponse::Ok().json(PostPage {
        title: post.title.clone(),
        post,
        comments,
    }))
}

/// The post form prefilled with the current values. Author only.
#[get("/post/{post_id}/update")]
pub async fn update_post_form(
    user_id: AuthenticatedUserId,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let post = authored_post(&pool, path.into_inner(), user_id.0).await?;
    let categories = Category::all(&pool).await?;
    let category = categories
        .iter()
        .find(|c| c.id == post.category_id)
        .map(|c| c.name.clone())
        .unwrap_or_default();

    let form = PostForm {
        title: post.title,
        content: post.content,
        category,
    };

    Ok(HttpResponse::Ok().json(json!({
        "title": "Update Post",
        "legend": "Update Post",
        "form": form,
        "categories": categories,
    })))
}

/// Update an existing post
///
/// Only the author may change the title, content or category.
#[post("/post/{post_id}/update")]
pub async fn update_post(
    user_id: AuthenticatedUserId,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, AppError> {
    let post = authored_post(&pool, path.into_inner(), user_id.0).await?;
    form.validate()?;
    let category = chosen_category(&pool, &form.category).await?;

    sqlx::query("UPDATE posts SET title = $1, content = $2, category_id = $3 WHERE id = $4")
        .bind(&form.title)
        .bind(&form.content)
        .bind(category.id)
        .bind(post.id)
        .execute(&**pool)
        .await?;

    info!("user {} updated post {}", user_id.0, post.id);
    Ok(Flash::success("Your post has been updated!", format!("/post/{}", post.id)).respond())
}

/// Delete a post and, through the foreign key, its comments. Author only.
#[post("/post/{post_id}/delete")]
pub async fn delete_post(
    user_id: AuthenticatedUserId,
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let post = authored_post(&pool, path.into_inner(), user_id.0).await?;

    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post.id)
        .execute(&**pool)
        .await?;

    info!("user {} deleted post {}", user_id.0, post.id);
    Ok(Flash::success("The post has been deleted!", "/").respond())
}

/// Posts filed under one category, newest first.
#[get("/category/{category_id}")]
pub async fn category_posts(
    path: web::Path<i32>,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let category = Category::find(&pool, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;
    let posts = load_page(&pool, PostFilter::InCategory(category.id), &query, config.posts_per_page).await?;
    let categories = Category::all(&pool).await?;

    Ok(HttpResponse::Ok().json(ListingPage {
        title: category.name,
        posts,
        categories,
    }))
}

/// Case-insensitive search over post content.
#[post("/search")]
pub async fn search(
    pool: web::Data<PgPool>,
    form: web::Form<SearchForm>,
) -> Result<impl Responder, AppError> {
    form.validate()?;
    let posts = PostSummary::search(&pool, &form.searched).await?;

    Ok(HttpResponse::Ok().json(SearchPage {
        title: "Search".into(),
        searched: form.into_inner().searched,
        posts,
    }))
}
