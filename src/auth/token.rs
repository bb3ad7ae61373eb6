use chrono::{NaiveDateTime, Utc};
use diesel::{prelude::*, SqliteConnection};
use rand::distributions::{Alphanumeric, DistString};

use crate::{
    app::AppError,
    database::models::user::User,
    schema::{tokens, users},
};

/** Opaque bearer credential, one per user */
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tokens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Token {
    pub secret: String,
    pub user_id: i32,
    pub created_at: NaiveDateTime,
}

impl Token {
    /// Issues a fresh random token for `user_id`.
    pub fn new(
        conn: &mut SqliteConnection,
        user_id: i32,
        length: usize,
    ) -> Result<Token, AppError> {
        let token = Token {
            secret: Alphanumeric.sample_string(&mut rand::thread_rng(), length),
            user_id,
            created_at: Utc::now().naive_utc(),
        };
        diesel::insert_into(tokens::table)
            .values(&token)
            .execute(conn)?;

        Ok(token)
    }

    /// Returns the user's token, issuing one if they have none. Concurrent
    /// callers converge on a single row through the `UNIQUE(user_id)` constraint.
    pub fn get_or_create(
        conn: &mut SqliteConnection,
        user_id: i32,
        length: usize,
    ) -> Result<Token, AppError> {
        let candidate = Token {
            secret: Alphanumeric.sample_string(&mut rand::thread_rng(), length),
            user_id,
            created_at: Utc::now().naive_utc(),
        };
        diesel::insert_into(tokens::table)
            .values(&candidate)
            .on_conflict(tokens::user_id)
            .do_nothing()
            .execute(conn)?;

        Ok(tokens::table
            .filter(tokens::user_id.eq(user_id))
            .select(Token::as_select())
            .first(conn)?)
    }

    /// Resolves a presented secret to its owner.
    pub fn find_user(conn: &mut SqliteConnection, secret: &str) -> Result<Option<User>, AppError> {
        Ok(tokens::table
            .inner_join(users::table)
            .filter(tokens::secret.eq(secret))
            .select(User::as_select())
            .first(conn)
            .optional()?)
    }

    /// Revokes every token held by `user_id`. Returns how many were removed.
    pub fn delete_for_user(conn: &mut SqliteConnection, user_id: i32) -> Result<usize, AppError> {
        Ok(diesel::delete(tokens::table.filter(tokens::user_id.eq(user_id))).execute(conn)?)
    }
}
