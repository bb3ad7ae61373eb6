pub mod blog;
pub mod comment;
pub mod token;
pub mod user;

use actix_web::web;

use crate::app::AppError;

/// Registers every endpoint plus the extractor configs that turn malformed
/// bodies, query strings and ids into [AppError]s.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::validation("body", err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::validation("query", err.to_string()).into()),
    )
    .app_data(web::PathConfig::default().error_handler(|_err, _req| AppError::NotFound.into()))
    //Auth routes
    .service(user::register)
    .service(user::login)
    .service(user::me)
    .service(token::logout)
    //Blog routes
    .service(blog::list_blogs)
    .service(blog::create_blog)
    .service(blog::get_blog)
    .service(blog::replace_blog)
    .service(blog::update_blog)
    .service(blog::delete_blog)
    .service(blog::like_blog)
    .service(blog::unlike_blog)
    //Comment routes
    .service(comment::create_comment)
    .service(comment::get_comments);
}
