use chrono::{NaiveDateTime, Utc};
use diesel::{prelude::*, SqliteConnection};
use serde::Deserialize;

use super::user::UserSummary;
use crate::{
    app::AppError,
    auth::permissions::Owned,
    schema::{blogs, users},
};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = blogs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Blog {
    pub id: i32,
    pub author_id: i32,
    pub title: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = blogs)]
struct BlogInsert<'a> {
    author_id: i32,
    title: &'a str,
    content: &'a str,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// Fields a blog update may touch. `None` leaves the column as it is.
#[derive(Debug, Default, Clone, Deserialize, AsChangeset)]
#[diesel(table_name = blogs)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl Owned for Blog {
    fn owner_id(&self) -> i32 {
        self.author_id
    }
}

impl Blog {
    pub fn new(
        conn: &mut SqliteConnection,
        author_id: i32,
        title: &str,
        content: &str,
    ) -> Result<Blog, AppError> {
        let time = Utc::now().naive_utc();

        let blog = diesel::insert_into(blogs::table)
            .values(&BlogInsert {
                author_id,
                title,
                content,
                created_at: time,
                updated_at: time,
            })
            .returning(Blog::as_returning())
            .get_result(conn)?;

        Ok(blog)
    }

    /// Fails with [AppError::NotFound] when no blog has `blog_id`.
    pub fn get_by_id(conn: &mut SqliteConnection, blog_id: i32) -> Result<Blog, AppError> {
        Ok(blogs::table
            .find(blog_id)
            .select(Blog::as_select())
            .first(conn)?)
    }

    pub fn exists(conn: &mut SqliteConnection, blog_id: i32) -> Result<bool, AppError> {
        Ok(diesel::select(diesel::dsl::exists(blogs::table.find(blog_id))).get_result(conn)?)
    }

    pub fn count(conn: &mut SqliteConnection) -> Result<i64, AppError> {
        Ok(blogs::table.count().get_result(conn)?)
    }

    /// The blog together with its author's public fields.
    pub fn get_with_author(
        conn: &mut SqliteConnection,
        blog_id: i32,
    ) -> Result<(Blog, UserSummary), AppError> {
        Ok(blogs::table
            .inner_join(users::table)
            .filter(blogs::id.eq(blog_id))
            .select((Blog::as_select(), UserSummary::as_select()))
            .first(conn)?)
    }

    /// One page of blogs with their authors, newest first; ties on
    /// `created_at` go to the higher id.
    pub fn page(
        conn: &mut SqliteConnection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<(Blog, UserSummary)>, AppError> {
        Ok(blogs::table
            .inner_join(users::table)
            .order((blogs::created_at.desc(), blogs::id.desc()))
            .limit(limit)
            .offset(offset)
            .select((Blog::as_select(), UserSummary::as_select()))
            .load(conn)?)
    }

    /// Applies `changes` and bumps `updated_at`.
    pub fn edit(
        &self,
        conn: &mut SqliteConnection,
        changes: &BlogChanges,
    ) -> Result<Blog, AppError> {
        let blog = diesel::update(blogs::table.find(self.id))
            .set((changes, blogs::updated_at.eq(Utc::now().naive_utc())))
            .returning(Blog::as_returning())
            .get_result(conn)?;

        Ok(blog)
    }

    /** Deletes the blog, its likes and comments cascade */
    pub fn delete(&self, conn: &mut SqliteConnection) -> Result<(), AppError> {
        diesel::delete(blogs::table.find(self.id)).execute(conn)?;
        Ok(())
    }
}
