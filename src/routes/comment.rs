use actix_web::{
    get, post,
    web::{self, Data, Json, Path, Query},
    HttpRequest, HttpResponse,
};

use crate::{
    app::{AppError, AppState},
    auth::AuthedUser,
    blogs::{
        feed::{self, CommentInput},
        pagination::{PageQuery, PageRequest},
    },
};

/// Pipe for commenting on a blog
/// - url: `{domain}/blogs/{blog_id}/comments`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <token>`
/// ## body
/// - json with non blank `content`
///
/// # Response
/// ## Created
/// ```
/// {
///     "id": 3,
///     "user": { "id": 2, "username": "bob", "email": null },
///     "content": "Nice post",
///     "created_at": "2024-06-01T09:22:30.664361Z"
/// }
/// ```
/// ## Error
/// - Unauthorized
/// - Not found
/// - Bad request
#[post("/blogs/{blog_id}/comments")]
pub async fn create_comment(
    AuthedUser(user): AuthedUser,
    app_state: Data<AppState>,
    blog_id: Path<i32>,
    payload: Json<CommentInput>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();

    let state = app_state.clone();
    let comment = web::block(move || {
        let mut conn = state.conn()?;
        feed::add_comment(&mut conn, &user, blog_id, &payload)
    })
    .await??;

    Ok(HttpResponse::Created().json(comment))
}

/// Pipe for every comment of a blog, newest first, paginated like `/blogs`
/// - url: `{domain}/blogs/{blog_id}/comments?page={page}&page_size={page_size}`
#[get("/blogs/{blog_id}/comments")]
pub async fn get_comments(
    req: HttpRequest,
    app_state: Data<AppState>,
    blog_id: Path<i32>,
    query: Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();
    let page = PageRequest::new(&query, &app_state.pagination)?;

    let state = app_state.clone();
    let comments = web::block(move || {
        let mut conn = state.conn()?;
        feed::list_comments(&mut conn, blog_id, &page)
    })
    .await??;

    Ok(HttpResponse::Ok().json(comments.into_page(req.path())))
}
