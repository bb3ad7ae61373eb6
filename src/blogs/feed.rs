use chrono::{DateTime, Utc};
use diesel::SqliteConnection;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::pagination::{PageRequest, Paginated};
use crate::{
    app::AppError,
    auth::permissions::ensure_can_modify,
    database::models::{
        blog::{Blog, BlogChanges},
        comment::Comment,
        like::Like,
        user::{User, UserSummary},
    },
};

/// How many recent comments each blog embeds.
pub const LATEST_COMMENTS: i64 = 5;
const MAX_TITLE_LENGTH: usize = 255;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlogInput {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommentInput {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub user: UserSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<(Comment, UserSummary)> for CommentView {
    fn from((comment, user): (Comment, UserSummary)) -> Self {
        Self {
            id: comment.id,
            user,
            content: comment.content,
            created_at: comment.created_at.and_utc(),
        }
    }
}

/// A blog as the feed shows it: live counts plus a preview of recent comments.
#[derive(Debug, Clone, Serialize)]
pub struct BlogView {
    pub id: i32,
    pub author: UserSummary,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub latest_comments: Vec<CommentView>,
}

impl BlogView {
    fn new(
        blog: Blog,
        author: UserSummary,
        likes_count: i64,
        comments_count: i64,
        latest_comments: Vec<CommentView>,
    ) -> Self {
        Self {
            id: blog.id,
            author,
            title: blog.title,
            content: blog.content,
            created_at: blog.created_at.and_utc(),
            updated_at: blog.updated_at.and_utc(),
            likes_count,
            comments_count,
            latest_comments,
        }
    }
}

fn latest_comments(
    conn: &mut SqliteConnection,
    blog_id: i32,
) -> Result<Vec<CommentView>, AppError> {
    Ok(Comment::find_by_blog(conn, blog_id, LATEST_COMMENTS, 0)?
        .into_iter()
        .map(CommentView::from)
        .collect())
}

fn ensure_blog_exists(conn: &mut SqliteConnection, blog_id: i32) -> Result<(), AppError> {
    match Blog::exists(conn, blog_id)? {
        true => Ok(()),
        false => Err(AppError::NotFound),
    }
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.is_empty() {
        return Err(AppError::validation("title", "This field may not be blank."));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::validation(
            "title",
            format!("Ensure this field has no more than {MAX_TITLE_LENGTH} characters."),
        ));
    }
    Ok(())
}

fn validate_content(field: &'static str, content: &str) -> Result<(), AppError> {
    if content.is_empty() {
        return Err(AppError::validation(field, "This field may not be blank."));
    }
    Ok(())
}

/// Blogs newest first with like/comment counts and the comment preview.
pub fn list_blogs(
    conn: &mut SqliteConnection,
    request: &PageRequest,
) -> Result<Paginated<BlogView>, AppError> {
    let count = Blog::count(conn)?;
    request.check_in_range(count)?;

    let rows = Blog::page(conn, request.limit(), request.offset())?;
    let ids: Vec<i32> = rows.iter().map(|(blog, _)| blog.id).collect();
    let likes = Like::counts_for_blogs(conn, &ids)?;
    let comments = Comment::counts_for_blogs(conn, &ids)?;

    let results = rows
        .into_iter()
        .map(|(blog, author)| -> Result<BlogView, AppError> {
            let latest = latest_comments(conn, blog.id)?;
            let likes_count = likes.get(&blog.id).copied().unwrap_or(0);
            let comments_count = comments.get(&blog.id).copied().unwrap_or(0);
            Ok(BlogView::new(blog, author, likes_count, comments_count, latest))
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!("listed {} of {count} blogs", results.len());

    Ok(Paginated {
        results,
        count,
        request: *request,
    })
}

pub fn get_blog(conn: &mut SqliteConnection, blog_id: i32) -> Result<BlogView, AppError> {
    let (blog, author) = Blog::get_with_author(conn, blog_id)?;
    let likes_count = Like::count_for_blog(conn, blog_id)?;
    let comments_count = Comment::count_for_blog(conn, blog_id)?;
    let latest = latest_comments(conn, blog_id)?;

    Ok(BlogView::new(blog, author, likes_count, comments_count, latest))
}

pub fn create_blog(
    conn: &mut SqliteConnection,
    author: &User,
    input: &BlogInput,
) -> Result<BlogView, AppError> {
    let title = input.title.trim();
    let content = input.content.trim();
    validate_title(title)?;
    validate_content("content", content)?;

    let blog = Blog::new(conn, author.id, title, content)?;
    info!("user {} created blog {}", author.id, blog.id);

    Ok(BlogView::new(blog, author.summary(), 0, 0, Vec::new()))
}

/// Owner-only edit of title and/or content.
pub fn update_blog(
    conn: &mut SqliteConnection,
    blog_id: i32,
    requester: &User,
    changes: BlogChanges,
) -> Result<BlogView, AppError> {
    let blog = Blog::get_by_id(conn, blog_id)?;
    ensure_can_modify(requester, &blog)?;

    let changes = BlogChanges {
        title: changes.title.map(|title| title.trim().to_string()),
        content: changes.content.map(|content| content.trim().to_string()),
    };
    if let Some(title) = &changes.title {
        validate_title(title)?;
    }
    if let Some(content) = &changes.content {
        validate_content("content", content)?;
    }

    blog.edit(conn, &changes)?;
    info!("user {} updated blog {}", requester.id, blog_id);

    get_blog(conn, blog_id)
}

/// Owner-only delete; likes and comments are removed by the cascade.
pub fn delete_blog(
    conn: &mut SqliteConnection,
    blog_id: i32,
    requester: &User,
) -> Result<(), AppError> {
    let blog = Blog::get_by_id(conn, blog_id)?;
    ensure_can_modify(requester, &blog)?;

    blog.delete(conn)?;
    info!("user {} deleted blog {}", requester.id, blog_id);

    Ok(())
}

pub fn like_blog(conn: &mut SqliteConnection, user: &User, blog_id: i32) -> Result<Like, AppError> {
    ensure_blog_exists(conn, blog_id)?;
    let like = Like::new(conn, user.id, blog_id)?;
    debug!("user {} liked blog {}", user.id, blog_id);

    Ok(like)
}

pub fn unlike_blog(conn: &mut SqliteConnection, user: &User, blog_id: i32) -> Result<(), AppError> {
    ensure_blog_exists(conn, blog_id)?;
    Like::delete(conn, user.id, blog_id)?;
    debug!("user {} unliked blog {}", user.id, blog_id);

    Ok(())
}

pub fn add_comment(
    conn: &mut SqliteConnection,
    user: &User,
    blog_id: i32,
    input: &CommentInput,
) -> Result<CommentView, AppError> {
    let content = input.content.trim();
    validate_content("content", content)?;
    ensure_blog_exists(conn, blog_id)?;

    let comment = Comment::new(conn, blog_id, user.id, content)?;
    debug!("user {} commented on blog {}", user.id, blog_id);

    Ok(CommentView::from((comment, user.summary())))
}

/// All comments of a blog, newest first.
pub fn list_comments(
    conn: &mut SqliteConnection,
    blog_id: i32,
    request: &PageRequest,
) -> Result<Paginated<CommentView>, AppError> {
    ensure_blog_exists(conn, blog_id)?;
    let count = Comment::count_for_blog(conn, blog_id)?;
    request.check_in_range(count)?;

    let results = Comment::find_by_blog(conn, blog_id, request.limit(), request.offset())?
        .into_iter()
        .map(CommentView::from)
        .collect();

    Ok(Paginated {
        results,
        count,
        request: *request,
    })
}
