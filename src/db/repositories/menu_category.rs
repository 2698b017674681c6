//! Menu category repository

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::MenuCategory;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait MenuCategoryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<MenuCategory>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<MenuCategory>>;
    async fn create(&self, category: &MenuCategory) -> Result<MenuCategory>;
    async fn update(&self, category: &MenuCategory) -> Result<bool>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
    async fn menu_count(&self, id: i64) -> Result<i64>;
}

const SELECT: &str =
    "SELECT id, name_ar, name_en, is_visible_user, is_active FROM menu_categories WHERE is_deleted = 0";

pub struct SqlxMenuCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxMenuCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MenuCategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MenuCategoryRepository for SqlxMenuCategoryRepository {
    async fn list(&self) -> Result<Vec<MenuCategory>> {
        let sql = format!("{} ORDER BY id", SELECT);
        let categories = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, MenuCategory>(&sql)
                .fetch_all(p)
                .await
                .context("Failed to list menu categories")?
        });
        Ok(categories)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<MenuCategory>> {
        let sql = format!("{} AND id = ?", SELECT);
        let category = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, MenuCategory>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get menu category")?
        });
        Ok(category)
    }

    async fn create(&self, category: &MenuCategory) -> Result<MenuCategory> {
        let sql = "INSERT INTO menu_categories (name_ar, name_en, is_visible_user, is_active) VALUES (?, ?, ?, ?)";
        let id = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(&category.name_ar)
                .bind(&category.name_en)
                .bind(category.is_visible_user)
                .bind(category.is_active)
                .execute(p)
                .await
                .context("Failed to create menu category")?
                .last_id()
        });
        Ok(MenuCategory {
            id,
            ..category.clone()
        })
    }

    async fn update(&self, category: &MenuCategory) -> Result<bool> {
        let sql = "UPDATE menu_categories SET name_ar = ?, name_en = ?, is_visible_user = ?, is_active = ? \
                   WHERE id = ? AND is_deleted = 0";
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(&category.name_ar)
                .bind(&category.name_en)
                .bind(category.is_visible_user)
                .bind(category.is_active)
                .bind(category.id)
                .execute(p)
                .await
                .context("Failed to update menu category")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE menu_categories SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete menu category")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn menu_count(&self, id: i64) -> Result<i64> {
        let count: i64 = with_pool!(self.pool, |p| {
            sqlx::query_scalar("SELECT COUNT(*) FROM menus WHERE category_id = ? AND is_deleted = 0")
                .bind(id)
                .fetch_one(p)
                .await
                .context("Failed to count menus in category")?
        });
        Ok(count)
    }
}
