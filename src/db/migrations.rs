//! Database migrations
//!
//! Migrations are embedded in the binary as SQL strings, one variant per
//! backend, and tracked in the `_migrations` table.
//!
//! ```ignore
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! Content tables carry an `is_deleted` flag for soft deletion next to the
//! user-editable `is_active` flag; soft-deleted rows are invisible to every
//! repository read.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (unique, ascending)
    pub version: i32,
    pub name: &'static str,
    pub up_sqlite: &'static str,
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i32,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_identity",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(36) PRIMARY KEY,
                first_name VARCHAR(100) NOT NULL,
                last_name VARCHAR(100) NOT NULL,
                user_name VARCHAR(100) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                phone_number VARCHAR(30),
                profile_picture_url VARCHAR(500),
                password_hash VARCHAR(255) NOT NULL,
                email_confirmed BOOLEAN NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                created_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS roles (
                id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(100) NOT NULL UNIQUE,
                description VARCHAR(255) NOT NULL DEFAULT '',
                created_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS user_roles (
                user_id VARCHAR(36) NOT NULL,
                role_id VARCHAR(36) NOT NULL,
                PRIMARY KEY (user_id, role_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS role_claims (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                role_id VARCHAR(36) NOT NULL,
                claim_type VARCHAR(50) NOT NULL,
                claim_value VARCHAR(150) NOT NULL,
                description VARCHAR(255) NOT NULL DEFAULT '',
                claim_group VARCHAR(100) NOT NULL DEFAULT '',
                UNIQUE (role_id, claim_value),
                FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id VARCHAR(36) NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(36) PRIMARY KEY,
                first_name VARCHAR(100) NOT NULL,
                last_name VARCHAR(100) NOT NULL,
                user_name VARCHAR(100) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                phone_number VARCHAR(30),
                profile_picture_url VARCHAR(500),
                password_hash VARCHAR(255) NOT NULL,
                email_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                created_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS roles (
                id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(100) NOT NULL UNIQUE,
                description VARCHAR(255) NOT NULL DEFAULT '',
                created_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS user_roles (
                user_id VARCHAR(36) NOT NULL,
                role_id VARCHAR(36) NOT NULL,
                PRIMARY KEY (user_id, role_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS role_claims (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                role_id VARCHAR(36) NOT NULL,
                claim_type VARCHAR(50) NOT NULL,
                claim_value VARCHAR(150) NOT NULL,
                description VARCHAR(255) NOT NULL DEFAULT '',
                claim_group VARCHAR(100) NOT NULL DEFAULT '',
                UNIQUE KEY uq_role_claims_value (role_id, claim_value),
                FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id VARCHAR(36) NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 2,
        name: "create_countries_and_cities",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS countries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name_ar VARCHAR(150) NOT NULL,
                name_en VARCHAR(150) NOT NULL,
                alpha2_code VARCHAR(2),
                alpha3_code VARCHAR(3),
                phone_code VARCHAR(10),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                created_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS cities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name_ar VARCHAR(150) NOT NULL,
                name_en VARCHAR(150) NOT NULL,
                country_id INTEGER NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                created_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (country_id) REFERENCES countries(id)
            );
            CREATE INDEX IF NOT EXISTS idx_cities_country_id ON cities(country_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS countries (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name_ar VARCHAR(150) NOT NULL,
                name_en VARCHAR(150) NOT NULL,
                alpha2_code VARCHAR(2),
                alpha3_code VARCHAR(3),
                phone_code VARCHAR(10),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                created_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS cities (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name_ar VARCHAR(150) NOT NULL,
                name_en VARCHAR(150) NOT NULL,
                country_id BIGINT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                created_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (country_id) REFERENCES countries(id)
            );
            CREATE INDEX idx_cities_country_id ON cities(country_id);
        "#,
    },
    Migration {
        version: 3,
        name: "create_blocks",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS block_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name_ar VARCHAR(150) NOT NULL,
                name_en VARCHAR(150) NOT NULL,
                block_type VARCHAR(30) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_deleted BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS blocks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER NOT NULL,
                parent_id INTEGER,
                name_en VARCHAR(255) NOT NULL,
                name_ar VARCHAR(255) NOT NULL,
                record_order INTEGER NOT NULL DEFAULT 0,
                url VARCHAR(500),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_visible BOOLEAN NOT NULL DEFAULT 1,
                create_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                image1 VARCHAR(255),
                image2 VARCHAR(255),
                image3 VARCHAR(255),
                description_en TEXT,
                description_ar TEXT,
                description_en1 TEXT,
                description_ar1 TEXT,
                description_en2 TEXT,
                description_ar2 TEXT,
                description_en3 TEXT,
                description_ar3 TEXT,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (category_id) REFERENCES block_categories(id),
                FOREIGN KEY (parent_id) REFERENCES blocks(id)
            );
            CREATE INDEX IF NOT EXISTS idx_blocks_category_id ON blocks(category_id);
            CREATE INDEX IF NOT EXISTS idx_blocks_parent_id ON blocks(parent_id);
            CREATE TABLE IF NOT EXISTS block_photos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                block_id INTEGER NOT NULL,
                image VARCHAR(255) NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (block_id) REFERENCES blocks(id)
            );
            CREATE INDEX IF NOT EXISTS idx_block_photos_block_id ON block_photos(block_id);
            CREATE TABLE IF NOT EXISTS block_videos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                block_id INTEGER NOT NULL,
                url VARCHAR(500) NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (block_id) REFERENCES blocks(id)
            );
            CREATE INDEX IF NOT EXISTS idx_block_videos_block_id ON block_videos(block_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS block_categories (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name_ar VARCHAR(150) NOT NULL,
                name_en VARCHAR(150) NOT NULL,
                block_type VARCHAR(30) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE
            );
            CREATE TABLE IF NOT EXISTS blocks (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                category_id BIGINT NOT NULL,
                parent_id BIGINT,
                name_en VARCHAR(255) NOT NULL,
                name_ar VARCHAR(255) NOT NULL,
                record_order INT NOT NULL DEFAULT 0,
                url VARCHAR(500),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_visible BOOLEAN NOT NULL DEFAULT TRUE,
                create_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                image1 VARCHAR(255),
                image2 VARCHAR(255),
                image3 VARCHAR(255),
                description_en LONGTEXT,
                description_ar LONGTEXT,
                description_en1 LONGTEXT,
                description_ar1 LONGTEXT,
                description_en2 LONGTEXT,
                description_ar2 LONGTEXT,
                description_en3 LONGTEXT,
                description_ar3 LONGTEXT,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (category_id) REFERENCES block_categories(id),
                FOREIGN KEY (parent_id) REFERENCES blocks(id)
            );
            CREATE INDEX idx_blocks_category_id ON blocks(category_id);
            CREATE INDEX idx_blocks_parent_id ON blocks(parent_id);
            CREATE TABLE IF NOT EXISTS block_photos (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                block_id BIGINT NOT NULL,
                image VARCHAR(255) NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (block_id) REFERENCES blocks(id)
            );
            CREATE INDEX idx_block_photos_block_id ON block_photos(block_id);
            CREATE TABLE IF NOT EXISTS block_videos (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                block_id BIGINT NOT NULL,
                url VARCHAR(500) NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (block_id) REFERENCES blocks(id)
            );
            CREATE INDEX idx_block_videos_block_id ON block_videos(block_id);
        "#,
    },
    Migration {
        version: 4,
        name: "create_menus",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS menu_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name_ar VARCHAR(150) NOT NULL,
                name_en VARCHAR(150) NOT NULL,
                is_visible_user BOOLEAN NOT NULL DEFAULT 1,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_deleted BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS menus (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER NOT NULL,
                parent_id INTEGER,
                name_en VARCHAR(255) NOT NULL,
                name_ar VARCHAR(255) NOT NULL,
                level_order INTEGER NOT NULL DEFAULT 0,
                url VARCHAR(500),
                menu_type VARCHAR(50),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_home BOOLEAN NOT NULL DEFAULT 0,
                is_footer BOOLEAN NOT NULL DEFAULT 0,
                is_home_footer BOOLEAN NOT NULL DEFAULT 0,
                image VARCHAR(255),
                file VARCHAR(255),
                description_en TEXT,
                description_ar TEXT,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (category_id) REFERENCES menu_categories(id),
                FOREIGN KEY (parent_id) REFERENCES menus(id)
            );
            CREATE INDEX IF NOT EXISTS idx_menus_category_id ON menus(category_id);
            CREATE INDEX IF NOT EXISTS idx_menus_parent_id ON menus(parent_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS menu_categories (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name_ar VARCHAR(150) NOT NULL,
                name_en VARCHAR(150) NOT NULL,
                is_visible_user BOOLEAN NOT NULL DEFAULT TRUE,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE
            );
            CREATE TABLE IF NOT EXISTS menus (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                category_id BIGINT NOT NULL,
                parent_id BIGINT,
                name_en VARCHAR(255) NOT NULL,
                name_ar VARCHAR(255) NOT NULL,
                level_order INT NOT NULL DEFAULT 0,
                url VARCHAR(500),
                menu_type VARCHAR(50),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_home BOOLEAN NOT NULL DEFAULT FALSE,
                is_footer BOOLEAN NOT NULL DEFAULT FALSE,
                is_home_footer BOOLEAN NOT NULL DEFAULT FALSE,
                image VARCHAR(255),
                file VARCHAR(255),
                description_en LONGTEXT,
                description_ar LONGTEXT,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (category_id) REFERENCES menu_categories(id),
                FOREIGN KEY (parent_id) REFERENCES menus(id)
            );
            CREATE INDEX idx_menus_category_id ON menus(category_id);
            CREATE INDEX idx_menus_parent_id ON menus(parent_id);
        "#,
    },
    Migration {
        version: 5,
        name: "create_pages",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                menu_id INTEGER,
                name_en VARCHAR(255) NOT NULL,
                name_ar VARCHAR(255) NOT NULL,
                record_order INTEGER NOT NULL DEFAULT 0,
                url VARCHAR(500),
                page_type VARCHAR(50),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                image VARCHAR(255),
                image1 VARCHAR(255),
                image2 VARCHAR(255),
                image3 VARCHAR(255),
                description_en TEXT,
                description_ar TEXT,
                description_en1 TEXT,
                description_ar1 TEXT,
                description_en2 TEXT,
                description_ar2 TEXT,
                description_en3 TEXT,
                description_ar3 TEXT,
                create_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (menu_id) REFERENCES menus(id)
            );
            CREATE INDEX IF NOT EXISTS idx_pages_menu_id ON pages(menu_id);
            CREATE TABLE IF NOT EXISTS page_photos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                page_id INTEGER NOT NULL,
                image VARCHAR(255) NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (page_id) REFERENCES pages(id)
            );
            CREATE INDEX IF NOT EXISTS idx_page_photos_page_id ON page_photos(page_id);
            CREATE TABLE IF NOT EXISTS page_attachments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                page_id INTEGER NOT NULL,
                file VARCHAR(255) NOT NULL,
                name VARCHAR(255) NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (page_id) REFERENCES pages(id)
            );
            CREATE INDEX IF NOT EXISTS idx_page_attachments_page_id ON page_attachments(page_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS pages (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                menu_id BIGINT,
                name_en VARCHAR(255) NOT NULL,
                name_ar VARCHAR(255) NOT NULL,
                record_order INT NOT NULL DEFAULT 0,
                url VARCHAR(500),
                page_type VARCHAR(50),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                image VARCHAR(255),
                image1 VARCHAR(255),
                image2 VARCHAR(255),
                image3 VARCHAR(255),
                description_en LONGTEXT,
                description_ar LONGTEXT,
                description_en1 LONGTEXT,
                description_ar1 LONGTEXT,
                description_en2 LONGTEXT,
                description_ar2 LONGTEXT,
                description_en3 LONGTEXT,
                description_ar3 LONGTEXT,
                create_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (menu_id) REFERENCES menus(id)
            );
            CREATE INDEX idx_pages_menu_id ON pages(menu_id);
            CREATE TABLE IF NOT EXISTS page_photos (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                page_id BIGINT NOT NULL,
                image VARCHAR(255) NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (page_id) REFERENCES pages(id)
            );
            CREATE INDEX idx_page_photos_page_id ON page_photos(page_id);
            CREATE TABLE IF NOT EXISTS page_attachments (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                page_id BIGINT NOT NULL,
                file VARCHAR(255) NOT NULL,
                name VARCHAR(255) NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (page_id) REFERENCES pages(id)
            );
            CREATE INDEX idx_page_attachments_page_id ON page_attachments(page_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_chat_messages",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_user_id VARCHAR(36) NOT NULL,
                to_user_id VARCHAR(36) NOT NULL,
                message TEXT NOT NULL,
                created_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                is_read BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (from_user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (to_user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_chat_messages_pair ON chat_messages(from_user_id, to_user_id);
            CREATE INDEX IF NOT EXISTS idx_chat_messages_to ON chat_messages(to_user_id, is_read);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                from_user_id VARCHAR(36) NOT NULL,
                to_user_id VARCHAR(36) NOT NULL,
                message TEXT NOT NULL,
                created_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (from_user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (to_user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_chat_messages_pair ON chat_messages(from_user_id, to_user_id);
            CREATE INDEX idx_chat_messages_to ON chat_messages(to_user_id, is_read);
        "#,
    },
];

/// Run all pending migrations
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;
    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    let sql = "SELECT version, name, applied_at FROM _migrations ORDER BY version";
    let records = crate::with_pool!(pool, |p| {
        sqlx::query_as::<_, MigrationRecord>(sql).fetch_all(p).await?
    });
    Ok(records)
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => migration.up_sqlite,
        DatabaseDriver::Mysql => migration.up_mysql,
    };

    for statement in split_sql_statements(sql) {
        pool.execute(statement)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    crate::with_pool!(pool, |p| {
        sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(p)
            .await?;
    });

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, dropping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Number of migrations not yet applied
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.iter().any(|a| a.version == m.version))
        .count())
}

pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

#[cfg(test)]
fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}
