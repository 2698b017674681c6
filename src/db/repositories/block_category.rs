//! Block category repository

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::BlockCategory;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait BlockCategoryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<BlockCategory>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<BlockCategory>>;
    async fn create(&self, category: &BlockCategory) -> Result<BlockCategory>;
    async fn update(&self, category: &BlockCategory) -> Result<bool>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
    /// Live blocks filed under the category
    async fn block_count(&self, id: i64) -> Result<i64>;
}

const SELECT: &str =
    "SELECT id, name_ar, name_en, block_type, is_active FROM block_categories WHERE is_deleted = 0";

pub struct SqlxBlockCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxBlockCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlockCategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlockCategoryRepository for SqlxBlockCategoryRepository {
    async fn list(&self) -> Result<Vec<BlockCategory>> {
        let sql = format!("{} ORDER BY id", SELECT);
        let categories = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, BlockCategory>(&sql)
                .fetch_all(p)
                .await
                .context("Failed to list block categories")?
        });
        Ok(categories)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlockCategory>> {
        let sql = format!("{} AND id = ?", SELECT);
        let category = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, BlockCategory>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get block category")?
        });
        Ok(category)
    }

    async fn create(&self, category: &BlockCategory) -> Result<BlockCategory> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO block_categories (name_ar, name_en, block_type, is_active) VALUES (?, ?, ?, ?)")
                .bind(&category.name_ar)
                .bind(&category.name_en)
                .bind(&category.block_type)
                .bind(category.is_active)
                .execute(p)
                .await
                .context("Failed to create block category")?
                .last_id()
        });
        Ok(BlockCategory {
            id,
            ..category.clone()
        })
    }

    async fn update(&self, category: &BlockCategory) -> Result<bool> {
        let sql = "UPDATE block_categories SET name_ar = ?, name_en = ?, block_type = ?, is_active = ? \
                   WHERE id = ? AND is_deleted = 0";
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(&category.name_ar)
                .bind(&category.name_en)
                .bind(&category.block_type)
                .bind(category.is_active)
                .bind(category.id)
                .execute(p)
                .await
                .context("Failed to update block category")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE block_categories SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete block category")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn block_count(&self, id: i64) -> Result<i64> {
        let count: i64 = with_pool!(self.pool, |p| {
            sqlx::query_scalar("SELECT COUNT(*) FROM blocks WHERE category_id = ? AND is_deleted = 0")
                .bind(id)
                .fetch_one(p)
                .await
                .context("Failed to count blocks in category")?
        });
        Ok(count)
    }
}
