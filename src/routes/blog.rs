use actix_web::{
    delete, get, patch, post, put,
    web::{self, Data, Json, Path, Query},
    HttpRequest, HttpResponse,
};
use serde_json::json;

use crate::{
    app::{AppError, AppState},
    auth::AuthedUser,
    blogs::{
        feed::{self, BlogInput},
        pagination::{PageQuery, PageRequest},
    },
    database::models::{blog::BlogChanges, user::User},
};

/// Pipe for listing blogs, newest first
/// - url: `{domain}/blogs?page={page}&page_size={page_size}`
///
/// # Response
/// ## Ok
/// ```
/// {
///     "count": 12,
///     "next": "/blogs?page=2&page_size=10",
///     "previous": null,
///     "results": [
///         {
///             "id": 12,
///             "author": { "id": 1, "username": "alice", "email": "a@x.com" },
///             "title": "Blog title",
///             "content": "Blog content",
///             "created_at": "2024-06-01T09:22:30.664361Z",
///             "updated_at": "2024-06-01T09:22:30.664361Z",
///             "likes_count": 3,
///             "comments_count": 7,
///             "latest_comments": [ ... at most 5, newest first ... ]
///         }
///     ]
/// }
/// ```
/// ## Error
/// - Not found (page out of range)
#[get("/blogs")]
pub async fn list_blogs(
    req: HttpRequest,
    app_state: Data<AppState>,
    query: Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::new(&query, &app_state.pagination)?;

    let state = app_state.clone();
    let blogs = web::block(move || {
        let mut conn = state.conn()?;
        feed::list_blogs(&mut conn, &page)
    })
    .await??;

    Ok(HttpResponse::Ok().json(blogs.into_page(req.path())))
}

/// Pipe for creating a new blog
/// - url: `{domain}/blogs`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <token>`
/// ## body
/// - json with `title` and `content`
///
/// # Response
/// ## Created
/// - the blog, with zero counts and no comments
/// ## Error
/// - Unauthorized
/// - Bad request
#[post("/blogs")]
pub async fn create_blog(
    AuthedUser(user): AuthedUser,
    app_state: Data<AppState>,
    payload: Json<BlogInput>,
) -> Result<HttpResponse, AppError> {
    let state = app_state.clone();
    let blog = web::block(move || {
        let mut conn = state.conn()?;
        feed::create_blog(&mut conn, &user, &payload)
    })
    .await??;

    Ok(HttpResponse::Created().json(blog))
}

/// Pipe for reading a single blog
/// - url: `{domain}/blogs/{blog_id}`
///
/// # Response
/// ## Ok
/// - the blog in the same shape as the listing
/// ## Error
/// - Not found
#[get("/blogs/{blog_id}")]
pub async fn get_blog(
    app_state: Data<AppState>,
    blog_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();

    let state = app_state.clone();
    let blog = web::block(move || {
        let mut conn = state.conn()?;
        feed::get_blog(&mut conn, blog_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(blog))
}

async fn apply_changes(
    user: User,
    app_state: Data<AppState>,
    blog_id: i32,
    changes: BlogChanges,
) -> Result<HttpResponse, AppError> {
    let blog = web::block(move || {
        let mut conn = app_state.conn()?;
        feed::update_blog(&mut conn, blog_id, &user, changes)
    })
    .await??;

    Ok(HttpResponse::Ok().json(blog))
}

/// Pipe for replacing a blog's title and content, author only
/// - url: `{domain}/blogs/{blog_id}`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <token>`
/// ## body
/// - json with both `title` and `content`
///
/// # Response
/// ## Ok
/// - the updated blog
/// ## Error
/// - Unauthorized
/// - Forbidden
/// - Not found
/// - Bad request
#[put("/blogs/{blog_id}")]
pub async fn replace_blog(
    AuthedUser(user): AuthedUser,
    app_state: Data<AppState>,
    blog_id: Path<i32>,
    payload: Json<BlogInput>,
) -> Result<HttpResponse, AppError> {
    let BlogInput { title, content } = payload.into_inner();
    let changes = BlogChanges {
        title: Some(title),
        content: Some(content),
    };

    apply_changes(user, app_state, blog_id.into_inner(), changes).await
}

/// Pipe for editing some of a blog's fields, author only
/// - url: `{domain}/blogs/{blog_id}`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <token>`
/// ## body
/// - json with the fields being changed: `title` and/or `content`
///
/// # Response
/// ## Ok
/// - the updated blog
/// ## Error
/// - Unauthorized
/// - Forbidden
/// - Not found
/// - Bad request
#[patch("/blogs/{blog_id}")]
pub async fn update_blog(
    AuthedUser(user): AuthedUser,
    app_state: Data<AppState>,
    blog_id: Path<i32>,
    payload: Json<BlogChanges>,
) -> Result<HttpResponse, AppError> {
    apply_changes(user, app_state, blog_id.into_inner(), payload.into_inner()).await
}

/// Pipe for deleting a blog, author only. Its likes and comments go with it.
/// - url: `{domain}/blogs/{blog_id}`
///
/// # Response
/// ## No content
/// ## Error
/// - Unauthorized
/// - Forbidden
/// - Not found
#[delete("/blogs/{blog_id}")]
pub async fn delete_blog(
    AuthedUser(user): AuthedUser,
    app_state: Data<AppState>,
    blog_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();

    let state = app_state.clone();
    web::block(move || {
        let mut conn = state.conn()?;
        feed::delete_blog(&mut conn, blog_id, &user)
    })
    .await??;

    Ok(HttpResponse::NoContent().finish())
}

/// Pipe for liking a blog. A second like from the same user is rejected.
/// - url: `{domain}/blogs/{blog_id}/like`
///
/// # Response
/// ## Created
/// ## Error
/// - Unauthorized
/// - Not found
/// - Bad request (already liked)
#[post("/blogs/{blog_id}/like")]
pub async fn like_blog(
    AuthedUser(user): AuthedUser,
    app_state: Data<AppState>,
    blog_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();

    let state = app_state.clone();
    web::block(move || {
        let mut conn = state.conn()?;
        feed::like_blog(&mut conn, &user, blog_id)
    })
    .await??;

    Ok(HttpResponse::Created().json(json!({ "detail": "Blog liked successfully." })))
}

/// Pipe for removing the caller's like
/// - url: `{domain}/blogs/{blog_id}/unlike`
///
/// # Response
/// ## Ok
/// ## Error
/// - Unauthorized
/// - Not found
/// - Bad request (not liked)
#[post("/blogs/{blog_id}/unlike")]
pub async fn unlike_blog(
    AuthedUser(user): AuthedUser,
    app_state: Data<AppState>,
    blog_id: Path<i32>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();

    let state = app_state.clone();
    web::block(move || {
        let mut conn = state.conn()?;
        feed::unlike_blog(&mut conn, &user, blog_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(json!({ "detail": "Blog unliked successfully." })))
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::StatusCode,
        test::{self, call_service},
        App,
    };
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;
    use crate::routes::{configure, test_utils};

    fn create_request(token: &str, title: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/blogs")
            .insert_header(test_utils::bearer(token))
            .set_json(json!({ "title": title, "content": format!("{title} content") }))
    }

    #[actix_rt::test]
    async fn test_like_flow_end_to_end() {
        let app_state = test_utils::app_state();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({ "username": "alice", "email": "a@x.com", "password": "secret1" }))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let alice: Value = test::read_body_json(resp).await;
        let alice_token = alice["token"].as_str().unwrap().to_string();
        let bob = test_utils::seed_user(&app_state, "bob");

        let req = create_request(&alice_token, "B").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let blog: Value = test::read_body_json(resp).await;
        assert_eq!(blog["likes_count"], 0);
        assert!(blog["created_at"].as_str().unwrap().ends_with('Z'));
        let like_uri = format!("/blogs/{}/like", blog["id"]);

        let req = test::TestRequest::post()
            .uri(&like_uri)
            .insert_header(test_utils::bearer(&bob.token))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri(&like_uri)
            .insert_header(test_utils::bearer(&bob.token))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "already_liked");

        let req = test::TestRequest::get().uri("/blogs").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page: Value = test::read_body_json(resp).await;
        assert_eq!(page["count"], 1);
        assert_eq!(page["results"][0]["likes_count"], 1);
        assert_eq!(page["results"][0]["author"]["username"], "alice");
    }

    #[actix_rt::test]
    async fn test_unlike() {
        let app_state = test_utils::app_state();
        let alice = test_utils::seed_user(&app_state, "alice");
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(configure),
        )
        .await;
        let req = create_request(&alice.token, "B").to_request();
        let blog: Value = test::read_body_json(call_service(&app, req).await).await;
        let unlike_uri = format!("/blogs/{}/unlike", blog["id"]);

        let req = test::TestRequest::post()
            .uri(&unlike_uri)
            .insert_header(test_utils::bearer(&alice.token))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "not_liked");

        let req = test::TestRequest::post()
            .uri(&format!("/blogs/{}/like", blog["id"]))
            .insert_header(test_utils::bearer(&alice.token))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri(&unlike_uri)
            .insert_header(test_utils::bearer(&alice.token))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn test_writes_require_authentication() {
        let app_state = test_utils::app_state();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/blogs")
            .set_json(json!({ "title": "t", "content": "c" }))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post().uri("/blogs/1/like").to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get().uri("/blogs").to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn test_blog_edit_by_owner_and_stranger() {
        let app_state = test_utils::app_state();
        let alice = test_utils::seed_user(&app_state, "alice");
        let mallory = test_utils::seed_user(&app_state, "mallory");
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(configure),
        )
        .await;
        let req = create_request(&alice.token, "Original").to_request();
        let blog: Value = test::read_body_json(call_service(&app, req).await).await;
        let blog_uri = format!("/blogs/{}", blog["id"]);

        let req = test::TestRequest::put()
            .uri(&blog_uri)
            .insert_header(test_utils::bearer(&mallory.token))
            .set_json(json!({ "title": "Defaced", "content": "gone" }))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "You do not have permission to modify this blog.");

        let req = test::TestRequest::delete()
            .uri(&blog_uri)
            .insert_header(test_utils::bearer(&mallory.token))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get().uri(&blog_uri).to_request();
        let unchanged: Value = test::read_body_json(call_service(&app, req).await).await;
        assert_eq!(unchanged["title"], "Original");

        let req = test::TestRequest::patch()
            .uri(&blog_uri)
            .insert_header(test_utils::bearer(&alice.token))
            .set_json(json!({ "title": "Edited" }))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let edited: Value = test::read_body_json(resp).await;
        assert_eq!(edited["title"], "Edited");
        assert_eq!(edited["content"], "Original content");

        let req = test::TestRequest::put()
            .uri(&blog_uri)
            .insert_header(test_utils::bearer(&alice.token))
            .set_json(json!({ "title": "Replaced" }))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/blogs/999")
            .insert_header(test_utils::bearer(&alice.token))
            .set_json(json!({ "title": "Replaced", "content": "body" }))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_blog_delete_cascades() {
        let app_state = test_utils::app_state();
        let alice = test_utils::seed_user(&app_state, "alice");
        let bob = test_utils::seed_user(&app_state, "bob");
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(configure),
        )
        .await;
        let req = create_request(&alice.token, "Doomed").to_request();
        let blog: Value = test::read_body_json(call_service(&app, req).await).await;
        let blog_uri = format!("/blogs/{}", blog["id"]);

        let req = test::TestRequest::post()
            .uri(&format!("{blog_uri}/like"))
            .insert_header(test_utils::bearer(&bob.token))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);
        let req = test::TestRequest::post()
            .uri(&format!("{blog_uri}/comments"))
            .insert_header(test_utils::bearer(&bob.token))
            .set_json(json!({ "content": "first!" }))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::delete()
            .uri(&blog_uri)
            .insert_header(test_utils::bearer(&alice.token))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        for uri in [blog_uri.clone(), format!("{blog_uri}/comments")] {
            let req = test::TestRequest::get().uri(&uri).to_request();
            assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        }
    }

    #[actix_rt::test]
    async fn test_list_pagination_links() {
        let app_state = test_utils::app_state();
        let alice = test_utils::seed_user(&app_state, "alice");
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(configure),
        )
        .await;
        for title in ["one", "two", "three"] {
            let req = create_request(&alice.token, title).to_request();
            assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get().uri("/blogs?page=1&page_size=2").to_request();
        let page: Value = test::read_body_json(call_service(&app, req).await).await;
        assert_eq!(page["count"], 3);
        assert_eq!(page["next"], "/blogs?page=2&page_size=2");
        assert_eq!(page["previous"], Value::Null);
        let titles: Vec<&str> = page["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["three", "two"]);

        let req = test::TestRequest::get().uri("/blogs?page=3&page_size=2").to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/blogs?page=abc").to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/blogs/not-a-number").to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
