//! Page photo and page attachment repositories

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::{PageAttachment, PagePhoto};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait PagePhotoRepository: Send + Sync {
    async fn list_by_page(&self, page_id: i64) -> Result<Vec<PagePhoto>>;
    async fn create(&self, page_id: i64, image: &str) -> Result<PagePhoto>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait PageAttachmentRepository: Send + Sync {
    async fn list_by_page(&self, page_id: i64) -> Result<Vec<PageAttachment>>;
    async fn create(&self, page_id: i64, file: &str, name: &str) -> Result<PageAttachment>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxPagePhotoRepository {
    pool: DynDatabasePool,
}

impl SqlxPagePhotoRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PagePhotoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PagePhotoRepository for SqlxPagePhotoRepository {
    async fn list_by_page(&self, page_id: i64) -> Result<Vec<PagePhoto>> {
        let photos = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, PagePhoto>(
                "SELECT id, image, page_id FROM page_photos WHERE page_id = ? AND is_deleted = 0 ORDER BY id",
            )
            .bind(page_id)
            .fetch_all(p)
            .await
            .context("Failed to list page photos")?
        });
        Ok(photos)
    }

    async fn create(&self, page_id: i64, image: &str) -> Result<PagePhoto> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO page_photos (page_id, image) VALUES (?, ?)")
                .bind(page_id)
                .bind(image)
                .execute(p)
                .await
                .context("Failed to create page photo")?
                .last_id()
        });
        Ok(PagePhoto {
            id,
            image: image.to_string(),
            page_id,
        })
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE page_photos SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete page photo")?
                .rows_affected()
        });
        Ok(affected > 0)
    }
}

pub struct SqlxPageAttachmentRepository {
    pool: DynDatabasePool,
}

impl SqlxPageAttachmentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PageAttachmentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PageAttachmentRepository for SqlxPageAttachmentRepository {
    async fn list_by_page(&self, page_id: i64) -> Result<Vec<PageAttachment>> {
        let attachments = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, PageAttachment>(
                "SELECT id, file, name, page_id FROM page_attachments WHERE page_id = ? AND is_deleted = 0 ORDER BY id",
            )
            .bind(page_id)
            .fetch_all(p)
            .await
            .context("Failed to list page attachments")?
        });
        Ok(attachments)
    }

    async fn create(&self, page_id: i64, file: &str, name: &str) -> Result<PageAttachment> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO page_attachments (page_id, file, name) VALUES (?, ?, ?)")
                .bind(page_id)
                .bind(file)
                .bind(name)
                .execute(p)
                .await
                .context("Failed to create page attachment")?
                .last_id()
        });
        Ok(PageAttachment {
            id,
            file: file.to_string(),
            name: name.to_string(),
            page_id,
        })
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE page_attachments SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete page attachment")?
                .rows_affected()
        });
        Ok(affected > 0)
    }
}
