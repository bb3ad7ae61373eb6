use std::time::Duration;

use diesel::{
    connection::SimpleConnection,
    r2d2::{self, ConnectionManager, CustomizeConnection, Pool, PooledConnection},
    SqliteConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info};

use crate::app::AppError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const IN_MEMORY: &str = ":memory:";

/// Pragmas every pooled connection needs: SQLite leaves foreign keys (and
/// therefore `ON DELETE CASCADE`) off unless asked per connection.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

/// Builds the connection pool for `database_url` and brings the schema up to date.
///
/// An in-memory database lives and dies with its connection, so `:memory:`
/// is pinned to a single connection that is never recycled.
///
/// # Example
/// ```
/// let pool = build_pool("blogfeed.db", 8)?;
/// let mut conn = pool.get()?;
/// ```
pub fn build_pool(database_url: &str, pool_size: u32) -> Result<DbPool, AppError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let customizer = SqlitePragmas {
        busy_timeout: Duration::from_secs(5),
    };

    let builder = Pool::builder().connection_customizer(Box::new(customizer));
    let builder = if database_url == IN_MEMORY {
        builder.max_size(1).idle_timeout(None).max_lifetime(None)
    } else {
        builder.max_size(pool_size)
    };

    let pool = builder
        .build(manager)
        .map_err(|e| AppError::Internal(format!("could not open {database_url}: {e}")))?;
    run_migrations(&pool)?;
    info!("database ready at {database_url}");

    Ok(pool)
}

fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    let mut pooled = pool.get()?;
    let conn: &mut SqliteConnection = &mut pooled;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| AppError::Internal(format!("migrations failed: {e}")))?;
    for version in applied {
        debug!("applied migration {version}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::{prelude::*, sql_query, sql_types::Integer};

    #[derive(QueryableByName)]
    struct Pragma {
        #[diesel(sql_type = Integer)]
        foreign_keys: i32,
    }

    #[test]
    fn in_memory_pool_is_migrated_with_foreign_keys_on() {
        let pool = build_pool(IN_MEMORY, 8).unwrap();
        pretty_assertions::assert_eq!(pool.max_size(), 1);

        let mut conn = pool.get().unwrap();
        let pragma = sql_query("PRAGMA foreign_keys")
            .get_result::<Pragma>(&mut conn)
            .unwrap();
        pretty_assertions::assert_eq!(pragma.foreign_keys, 1);

        let users: i64 = crate::schema::users::table.count().get_result(&mut conn).unwrap();
        pretty_assertions::assert_eq!(users, 0);
    }
}
