use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use diesel::{dsl::count, prelude::*, SqliteConnection};

use super::user::UserSummary;
use crate::{
    app::AppError,
    schema::{comments, users},
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Comment {
    pub id: i32,
    pub user_id: i32,
    pub blog_id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = comments)]
struct CommentInsert<'a> {
    user_id: i32,
    blog_id: i32,
    content: &'a str,
    created_at: NaiveDateTime,
}

impl Comment {
    /** Creates a comment on the blog specified */
    pub fn new(
        conn: &mut SqliteConnection,
        blog_id: i32,
        user_id: i32,
        content: &str,
    ) -> Result<Comment, AppError> {
        let comment = diesel::insert_into(comments::table)
            .values(&CommentInsert {
                user_id,
                blog_id,
                content,
                created_at: Utc::now().naive_utc(),
            })
            .returning(Comment::as_returning())
            .get_result(conn)?;

        Ok(comment)
    }

    pub fn count_for_blog(conn: &mut SqliteConnection, blog_id: i32) -> Result<i64, AppError> {
        Ok(comments::table
            .filter(comments::blog_id.eq(blog_id))
            .count()
            .get_result(conn)?)
    }

    /// Comment counts keyed by blog id. Blogs without comments are absent from the map.
    pub fn counts_for_blogs(
        conn: &mut SqliteConnection,
        blog_ids: &[i32],
    ) -> Result<HashMap<i32, i64>, AppError> {
        let rows = comments::table
            .filter(comments::blog_id.eq_any(blog_ids))
            .group_by(comments::blog_id)
            .select((comments::blog_id, count(comments::id)))
            .load::<(i32, i64)>(conn)?;

        Ok(rows.into_iter().collect())
    }

    /// Comments on a blog with their authors, newest first (ties: higher id first).
    /// Ordering happens before the limit is applied.
    pub fn find_by_blog(
        conn: &mut SqliteConnection,
        blog_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<(Comment, UserSummary)>, AppError> {
        Ok(comments::table
            .inner_join(users::table)
            .filter(comments::blog_id.eq(blog_id))
            .order((comments::created_at.desc(), comments::id.desc()))
            .limit(limit)
            .offset(offset)
            .select((Comment::as_select(), UserSummary::as_select()))
            .load(conn)?)
    }
}
