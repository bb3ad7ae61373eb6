use chrono::{NaiveDateTime, Utc};
use diesel::{prelude::*, SqliteConnection};
use serde::Serialize;

use crate::{app::AppError, schema::users};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    /// bcrypt hash (`$2b$<cost>$...`), see [crate::auth::password]
    pub password: String,
    pub created_at: NaiveDateTime,
}

/** Public fields of a user, embedded in blogs and comments */
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct UserInsert<'a> {
    username: &'a str,
    email: Option<&'a str>,
    password: &'a str,
    created_at: NaiveDateTime,
}

impl User {
    /// Inserts a user whose credential has already been hashed.
    pub fn new(
        conn: &mut SqliteConnection,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let user = diesel::insert_into(users::table)
            .values(&UserInsert {
                username,
                email,
                password: password_hash,
                created_at: Utc::now().naive_utc(),
            })
            .returning(User::as_returning())
            .get_result(conn)?;

        Ok(user)
    }

    pub fn find_by_username(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(conn)
            .optional()?)
    }

    pub fn username_taken(conn: &mut SqliteConnection, username: &str) -> Result<bool, AppError> {
        Ok(diesel::select(diesel::dsl::exists(
            users::table.filter(users::username.eq(username)),
        ))
        .get_result(conn)?)
    }

    pub fn email_taken(conn: &mut SqliteConnection, email: &str) -> Result<bool, AppError> {
        Ok(diesel::select(diesel::dsl::exists(
            users::table.filter(users::email.eq(email)),
        ))
        .get_result(conn)?)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}
