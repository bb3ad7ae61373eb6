pub mod password;
pub mod permissions;
pub mod token;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use diesel::{Connection, SqliteConnection};
use futures::future::LocalBoxFuture;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use self::{
    password::{hash_password, verify_password},
    token::Token,
};
use crate::{
    app::{AppError, AppState},
    config::AuthConfig,
    database::models::user::{User, UserSummary},
};

const MAX_USERNAME_LENGTH: usize = 150;
const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// What registration and login hand back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Registration, login and token resolution. Built once from [AuthConfig].
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Creates the user and their first token in one transaction.
    pub fn register(
        &self,
        conn: &mut SqliteConnection,
        request: &RegisterRequest,
    ) -> Result<AuthResponse, AppError> {
        let username = request.username.trim();
        let email = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty());

        validate_username(username)?;
        if let Some(email) = email {
            validate_email(email)?;
        }
        if request.password.chars().count() < self.config.min_password_length {
            return Err(AppError::validation(
                "password",
                format!(
                    "Ensure this field has at least {} characters.",
                    self.config.min_password_length
                ),
            ));
        }

        let password_hash = hash_password(&request.password, self.config.password_cost)?;
        let (user, token) = conn.transaction::<_, AppError, _>(|conn| {
            if User::username_taken(conn, username)? {
                return Err(AppError::validation(
                    "username",
                    "A user with that username already exists.",
                ));
            }
            if let Some(email) = email {
                if User::email_taken(conn, email)? {
                    return Err(AppError::validation(
                        "email",
                        "A user with that email already exists.",
                    ));
                }
            }

            let user = User::new(conn, username, email, &password_hash)?;
            let token = Token::new(conn, user.id, self.config.token_length)?;
            Ok((user, token))
        })?;
        info!("registered user {} ({})", user.username, user.id);

        Ok(AuthResponse {
            token: token.secret,
            user: user.summary(),
        })
    }

    /// Verifies the credential and returns the user's token, issuing one if needed.
    pub fn login(
        &self,
        conn: &mut SqliteConnection,
        request: &LoginRequest,
    ) -> Result<AuthResponse, AppError> {
        if request.username.trim().is_empty() {
            return Err(AppError::validation("username", "This field may not be blank."));
        }
        if request.password.is_empty() {
            return Err(AppError::validation("password", "This field may not be blank."));
        }

        let user = User::find_by_username(conn, request.username.trim())?
            .filter(|user| verify_password(&request.password, &user.password))
            .ok_or(AppError::InvalidCredentials)?;
        let token = Token::get_or_create(conn, user.id, self.config.token_length)?;
        info!("user {} logged in", user.id);

        Ok(AuthResponse {
            token: token.secret,
            user: user.summary(),
        })
    }

    /// Maps a presented bearer token to exactly one user.
    pub fn authenticate(
        &self,
        conn: &mut SqliteConnection,
        secret: &str,
    ) -> Result<User, AppError> {
        if secret.is_empty() {
            return Err(AppError::Unauthenticated);
        }
        Token::find_user(conn, secret)?.ok_or(AppError::Unauthenticated)
    }

    /// Revokes the user's token; the next login issues a new one.
    pub fn logout(&self, conn: &mut SqliteConnection, user: &User) -> Result<(), AppError> {
        let removed = Token::delete_for_user(conn, user.id)?;
        debug!("revoked {removed} token(s) of user {}", user.id);
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<(), AppError> {
    if username.is_empty() {
        return Err(AppError::validation("username", "This field may not be blank."));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AppError::validation(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_LENGTH} characters."),
        ));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(AppError::validation(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::validation("email", "Enter a valid email address.");

    if email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty());
    if local.is_empty() || !domain_ok {
        return Err(invalid());
    }

    Ok(())
}

/// Extractor for endpoints that require a logged in user. Reads
/// `Authorization: Bearer <token>` and resolves it against the token table.
#[derive(Debug, Clone)]
pub struct AuthedUser(pub User);

impl FromRequest for AuthedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let bearer = BearerAuth::extract(req);
        let app_state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let credentials = bearer.await.map_err(|_| AppError::Unauthenticated)?;
            let app_state = app_state
                .ok_or_else(|| AppError::Internal("application state not configured".into()))?;
            let secret = credentials.token().to_string();

            let user = web::block(move || {
                let mut conn = app_state.conn()?;
                app_state.auth.authenticate(&mut conn, &secret)
            })
            .await??;

            Ok(AuthedUser(user))
        })
    }
}
