use actix_web::{
    post,
    web::{self, Data},
    HttpResponse,
};

use crate::{
    app::{AppError, AppState},
    auth::AuthedUser,
};

/// Pipe for revoking the caller's token
/// - url: `{domain}/auth/logout`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <token>`
///
/// # Response
/// ## No content
/// ## Error
/// - Unauthorized
#[post("/auth/logout")]
pub async fn logout(
    AuthedUser(user): AuthedUser,
    app_state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let state = app_state.clone();
    web::block(move || {
        let mut conn = state.conn()?;
        state.auth.logout(&mut conn, &user)
    })
    .await??;

    Ok(HttpResponse::NoContent().finish())
}
