//! Fixtures shared by repository tests

use crate::db::{create_test_pool, migrations, DynDatabasePool};

/// Fresh in-memory database with every migration applied
pub async fn migrated_pool() -> DynDatabasePool {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Insert a bare user row for foreign keys
pub async fn insert_user(pool: &DynDatabasePool, id: &str) {
    sqlx::query(
        "INSERT INTO users (id, first_name, last_name, user_name, email, password_hash) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind("Test")
    .bind(id)
    .bind(format!("user-{}", id))
    .bind(format!("{}@example.com", id))
    .bind("hash")
    .execute(pool.as_sqlite().expect("sqlite pool"))
    .await
    .expect("Failed to insert user");
}

pub async fn insert_block_category(pool: &DynDatabasePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO block_categories (name_ar, name_en, block_type) VALUES (?, ?, 'Blog')")
        .bind(name)
        .bind(name)
        .execute(pool.as_sqlite().expect("sqlite pool"))
        .await
        .expect("Failed to insert block category")
        .last_insert_rowid()
}

pub async fn insert_menu_category(pool: &DynDatabasePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO menu_categories (name_ar, name_en) VALUES (?, ?)")
        .bind(name)
        .bind(name)
        .execute(pool.as_sqlite().expect("sqlite pool"))
        .await
        .expect("Failed to insert menu category")
        .last_insert_rowid()
}
