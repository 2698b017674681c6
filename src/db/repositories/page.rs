//! Page repository

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::Page;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Live pages, optionally restricted to one menu
    async fn list(&self, menu_id: Option<i64>) -> Result<Vec<Page>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Page>>;
    async fn create(&self, page: &Page) -> Result<i64>;
    async fn update(&self, page: &Page) -> Result<bool>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

const SELECT: &str = "SELECT p.id, p.menu_id, p.name_en, p.name_ar, p.record_order, p.url, p.page_type, \
     p.is_active, p.image, p.image1, p.image2, p.image3, p.description_en, p.description_ar, \
     p.description_en1, p.description_ar1, p.description_en2, p.description_ar2, \
     p.description_en3, p.description_ar3, p.create_at, m.name_en AS menu_name_en \
     FROM pages p LEFT JOIN menus m ON m.id = p.menu_id \
     WHERE p.is_deleted = 0";

pub struct SqlxPageRepository {
    pool: DynDatabasePool,
}

impl SqlxPageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PageRepository for SqlxPageRepository {
    async fn list(&self, menu_id: Option<i64>) -> Result<Vec<Page>> {
        let filter = if menu_id.is_some() { "AND p.menu_id = ?" } else { "" };
        let sql = format!("{} {} ORDER BY p.record_order, p.id", SELECT, filter);
        let pages = with_pool!(self.pool, |p| {
            let mut query = sqlx::query_as::<_, Page>(&sql);
            if let Some(menu_id) = menu_id {
                query = query.bind(menu_id);
            }
            query.fetch_all(p).await.context("Failed to list pages")?
        });
        Ok(pages)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Page>> {
        let sql = format!("{} AND p.id = ?", SELECT);
        let page = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Page>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get page")?
        });
        Ok(page)
    }

    async fn create(&self, page: &Page) -> Result<i64> {
        let sql = "INSERT INTO pages (menu_id, name_en, name_ar, record_order, url, page_type, is_active, image, \
                   image1, image2, image3, description_en, description_ar, description_en1, description_ar1, \
                   description_en2, description_ar2, description_en3, description_ar3, create_at) \
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
        let body = &page.body;
        let id = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(page.menu_id)
                .bind(&page.name_en)
                .bind(&page.name_ar)
                .bind(page.record_order)
                .bind(&page.url)
                .bind(&page.page_type)
                .bind(page.is_active)
                .bind(&page.image)
                .bind(&body.image1)
                .bind(&body.image2)
                .bind(&body.image3)
                .bind(&body.description_en)
                .bind(&body.description_ar)
                .bind(&body.description_en1)
                .bind(&body.description_ar1)
                .bind(&body.description_en2)
                .bind(&body.description_ar2)
                .bind(&body.description_en3)
                .bind(&body.description_ar3)
                .bind(page.create_at)
                .execute(p)
                .await
                .context("Failed to create page")?
                .last_id()
        });
        Ok(id)
    }

    async fn update(&self, page: &Page) -> Result<bool> {
        let sql = "UPDATE pages SET menu_id = ?, name_en = ?, name_ar = ?, record_order = ?, url = ?, \
                   page_type = ?, is_active = ?, image = ?, image1 = ?, image2 = ?, image3 = ?, \
                   description_en = ?, description_ar = ?, description_en1 = ?, description_ar1 = ?, \
                   description_en2 = ?, description_ar2 = ?, description_en3 = ?, description_ar3 = ?, \
                   create_at = ? WHERE id = ? AND is_deleted = 0";
        let body = &page.body;
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(page.menu_id)
                .bind(&page.name_en)
                .bind(&page.name_ar)
                .bind(page.record_order)
                .bind(&page.url)
                .bind(&page.page_type)
                .bind(page.is_active)
                .bind(&page.image)
                .bind(&body.image1)
                .bind(&body.image2)
                .bind(&body.image3)
                .bind(&body.description_en)
                .bind(&body.description_ar)
                .bind(&body.description_en1)
                .bind(&body.description_ar1)
                .bind(&body.description_en2)
                .bind(&body.description_ar2)
                .bind(&body.description_en3)
                .bind(&body.description_ar3)
                .bind(page.create_at)
                .bind(page.id)
                .execute(p)
                .await
                .context("Failed to update page")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE pages SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete page")?
                .rows_affected()
        });
        Ok(affected > 0)
    }
}
