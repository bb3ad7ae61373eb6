use actix_web::{
    get, post,
    web::{self, Data, Json},
    HttpResponse,
};

use crate::{
    app::{AppError, AppState},
    auth::{AuthedUser, LoginRequest, RegisterRequest},
};

/// Pipe for registering a new user
/// - url: `{domain}/auth/register`
///
/// # HTTP request requirements
/// ## body
/// - json with `username`, `password` and optionally `email`
/// - `password` must be at least `MIN_PASSWORD_LENGTH` characters long
///
/// # Response
/// ## Created
/// ```
/// { "token": "Xq3...", "user": { "id": 1, "username": "alice", "email": "a@x.com" } }
/// ```
/// ## Error
/// - Bad request (validation error, username or email taken)
#[post("/auth/register")]
pub async fn register(
    app_state: Data<AppState>,
    payload: Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let state = app_state.clone();
    let response = web::block(move || {
        let mut conn = state.conn()?;
        state.auth.register(&mut conn, &payload)
    })
    .await??;

    Ok(HttpResponse::Created().json(response))
}

/// Pipe for logging in as user
/// - url: `{domain}/auth/login`
///
/// # HTTP request requirements
/// ## body
/// - json with `username` and `password`
///
/// # Response
/// ## Ok
/// - the user's token and public fields, same shape as registration
/// ## Error
/// - Bad request (invalid credentials)
#[post("/auth/login")]
pub async fn login(
    app_state: Data<AppState>,
    payload: Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let state = app_state.clone();
    let response = web::block(move || {
        let mut conn = state.conn()?;
        state.auth.login(&mut conn, &payload)
    })
    .await??;

    Ok(HttpResponse::Ok().json(response))
}

/// Pipe for reading the authenticated user
/// - url: `{domain}/auth/me`
///
/// # Response
/// ## Ok
/// - `{ "id", "username", "email" }`
/// ## Error
/// - Unauthorized
#[get("/auth/me")]
pub async fn me(AuthedUser(user): AuthedUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(user.summary()))
}
