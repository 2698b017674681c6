//! Database layer
//!
//! SQLite (default, single-file deployment) and MySQL are both supported
//! behind the `DatabasePool` trait; the driver comes from configuration.
//!
//! ```ignore
//! use orbit_admin::config::DatabaseConfig;
//! use orbit_admin::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, LastInsertId, MysqlDatabase,
    SqliteDatabase,
};

/// Run one sqlx body against whichever backend a `DynDatabasePool` wraps.
///
/// The body is expanded once per driver with `$p` bound to `&SqlitePool` or
/// `&MySqlPool`, so `query_as` and friends resolve the right database type.
/// Both backends take `?` placeholders, which lets the SQL text be shared.
/// Must be used inside a function returning `anyhow::Result`.
#[macro_export]
macro_rules! with_pool {
    ($pool:expr, |$p:ident| $body:expr) => {{
        match $pool.driver() {
            $crate::config::DatabaseDriver::Sqlite => {
                let $p = $pool
                    .as_sqlite()
                    .ok_or_else(|| anyhow::anyhow!("SQLite pool unavailable"))?;
                $body
            }
            $crate::config::DatabaseDriver::Mysql => {
                let $p = $pool
                    .as_mysql()
                    .ok_or_else(|| anyhow::anyhow!("MySQL pool unavailable"))?;
                $body
            }
        }
    }};
}
