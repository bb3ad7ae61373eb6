use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::{
    auth::AuthService,
    config::{Config, PaginationConfig},
    database::db_utils::{build_pool, DbPool, PooledConn},
};

/** Shared by every request: the connection pool plus the services built from config */
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub auth: AuthService,
    pub pagination: PaginationConfig,
}

impl AppState {
    /// Opens (and migrates) the database named in `config`.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let pool = build_pool(&config.database_url, config.pool_size)?;

        Ok(Self {
            pool,
            auth: AuthService::new(config.auth.clone()),
            pagination: config.pagination,
        })
    }

    pub fn conn(&self) -> Result<PooledConn, AppError> {
        Ok(self.pool.get()?)
    }
}

/** Every failure a request can end with */
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthenticated,
    #[error("You do not have permission to modify this blog.")]
    PermissionDenied,
    #[error("Not found.")]
    NotFound,
    #[error("You have already liked this blog.")]
    AlreadyLiked,
    #[error("You haven't liked this blog yet.")]
    NotLiked,
    #[error("{0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Unauthenticated => "not_authenticated",
            AppError::PermissionDenied => "permission_denied",
            AppError::NotFound => "not_found",
            AppError::AlreadyLiked => "already_liked",
            AppError::NotLiked => "not_liked",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: String,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. }
            | AppError::InvalidCredentials
            | AppError::AlreadyLiked
            | AppError::NotLiked => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(reason) = self {
            error!("request failed: {reason}");
        }
        let field = match self {
            AppError::Validation { field, .. } => Some(*field),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            detail: self.to_string(),
            code: self.code(),
            field,
        })
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                AppError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                AppError::NotFound
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        AppError::Internal(format!("connection pool: {err}"))
    }
}

impl From<BlockingError> for AppError {
    fn from(err: BlockingError) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = [
            (AppError::validation("title", "required"), 400),
            (AppError::InvalidCredentials, 400),
            (AppError::Unauthenticated, 401),
            (AppError::PermissionDenied, 403),
            (AppError::NotFound, 404),
            (AppError::AlreadyLiked, 400),
            (AppError::NotLiked, 400),
            (AppError::Conflict("dup".into()), 409),
            (AppError::Internal("boom".into()), 500),
        ];
        for (err, status) in cases {
            pretty_assertions::assert_eq!(err.status_code().as_u16(), status, "{err:?}");
        }
    }

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        assert!(matches!(AppError::from(DieselError::NotFound), AppError::NotFound));
    }

    #[actix_rt::test]
    async fn error_body_carries_detail_and_code() {
        let resp = AppError::validation("password", "too short").error_response();
        pretty_assertions::assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = body::to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        pretty_assertions::assert_eq!(value["detail"], "too short");
        pretty_assertions::assert_eq!(value["code"], "validation_error");
        pretty_assertions::assert_eq!(value["field"], "password");
    }

    #[actix_rt::test]
    async fn internal_errors_hide_their_reason() {
        let resp = AppError::Internal("disk on fire".into()).error_response();
        let bytes = body::to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        pretty_assertions::assert_eq!(value["detail"], "Internal server error");
        assert!(value.get("field").is_none());
    }
}
