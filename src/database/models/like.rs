use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use diesel::{
    dsl::count,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    SqliteConnection,
};

use crate::{app::AppError, schema::likes};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Like {
    pub id: i32,
    pub user_id: i32,
    pub blog_id: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = likes)]
struct LikeInsert {
    user_id: i32,
    blog_id: i32,
    created_at: NaiveDateTime,
}

impl Like {
    /// Inserts the (user, blog) pair. The unique index decides duplicates,
    /// so two racing requests cannot both succeed.
    pub fn new(conn: &mut SqliteConnection, user_id: i32, blog_id: i32) -> Result<Like, AppError> {
        diesel::insert_into(likes::table)
            .values(&LikeInsert {
                user_id,
                blog_id,
                created_at: Utc::now().naive_utc(),
            })
            .returning(Like::as_returning())
            .get_result(conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    AppError::AlreadyLiked
                }
                other => other.into(),
            })
    }

    /// Removes the pair, [AppError::NotLiked] if there was nothing to remove.
    pub fn delete(conn: &mut SqliteConnection, user_id: i32, blog_id: i32) -> Result<(), AppError> {
        let removed = diesel::delete(
            likes::table
                .filter(likes::user_id.eq(user_id))
                .filter(likes::blog_id.eq(blog_id)),
        )
        .execute(conn)?;

        match removed {
            0 => Err(AppError::NotLiked),
            _ => Ok(()),
        }
    }

    pub fn count_for_blog(conn: &mut SqliteConnection, blog_id: i32) -> Result<i64, AppError> {
        Ok(likes::table
            .filter(likes::blog_id.eq(blog_id))
            .count()
            .get_result(conn)?)
    }

    /// Like counts keyed by blog id. Blogs without likes are absent from the map.
    pub fn counts_for_blogs(
        conn: &mut SqliteConnection,
        blog_ids: &[i32],
    ) -> Result<HashMap<i32, i64>, AppError> {
        let rows = likes::table
            .filter(likes::blog_id.eq_any(blog_ids))
            .group_by(likes::blog_id)
            .select((likes::blog_id, count(likes::id)))
            .load::<(i32, i64)>(conn)?;

        Ok(rows.into_iter().collect())
    }
}
