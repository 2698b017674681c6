//! Block photo and block video repositories

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::{BlockPhoto, BlockVideo};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait BlockPhotoRepository: Send + Sync {
    async fn list_by_block(&self, block_id: i64) -> Result<Vec<BlockPhoto>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<BlockPhoto>>;
    async fn create(&self, block_id: i64, image: &str) -> Result<BlockPhoto>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait BlockVideoRepository: Send + Sync {
    async fn list_by_block(&self, block_id: i64) -> Result<Vec<BlockVideo>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<BlockVideo>>;
    async fn create(&self, block_id: i64, url: &str) -> Result<BlockVideo>;
    async fn update(&self, video: &BlockVideo) -> Result<bool>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxBlockPhotoRepository {
    pool: DynDatabasePool,
}

impl SqlxBlockPhotoRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlockPhotoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlockPhotoRepository for SqlxBlockPhotoRepository {
    async fn list_by_block(&self, block_id: i64) -> Result<Vec<BlockPhoto>> {
        let photos = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, BlockPhoto>(
                "SELECT id, image, block_id FROM block_photos WHERE block_id = ? AND is_deleted = 0 ORDER BY id",
            )
            .bind(block_id)
            .fetch_all(p)
            .await
            .context("Failed to list block photos")?
        });
        Ok(photos)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlockPhoto>> {
        let photo = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, BlockPhoto>(
                "SELECT id, image, block_id FROM block_photos WHERE id = ? AND is_deleted = 0",
            )
            .bind(id)
            .fetch_optional(p)
            .await
            .context("Failed to get block photo")?
        });
        Ok(photo)
    }

    async fn create(&self, block_id: i64, image: &str) -> Result<BlockPhoto> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO block_photos (block_id, image) VALUES (?, ?)")
                .bind(block_id)
                .bind(image)
                .execute(p)
                .await
                .context("Failed to create block photo")?
                .last_id()
        });
        Ok(BlockPhoto {
            id,
            image: image.to_string(),
            block_id,
        })
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE block_photos SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete block photo")?
                .rows_affected()
        });
        Ok(affected > 0)
    }
}

pub struct SqlxBlockVideoRepository {
    pool: DynDatabasePool,
}

impl SqlxBlockVideoRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlockVideoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlockVideoRepository for SqlxBlockVideoRepository {
    async fn list_by_block(&self, block_id: i64) -> Result<Vec<BlockVideo>> {
        let videos = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, BlockVideo>(
                "SELECT id, url, block_id FROM block_videos WHERE block_id = ? AND is_deleted = 0 ORDER BY id",
            )
            .bind(block_id)
            .fetch_all(p)
            .await
            .context("Failed to list block videos")?
        });
        Ok(videos)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlockVideo>> {
        let video = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, BlockVideo>(
                "SELECT id, url, block_id FROM block_videos WHERE id = ? AND is_deleted = 0",
            )
            .bind(id)
            .fetch_optional(p)
            .await
            .context("Failed to get block video")?
        });
        Ok(video)
    }

    async fn create(&self, block_id: i64, url: &str) -> Result<BlockVideo> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO block_videos (block_id, url) VALUES (?, ?)")
                .bind(block_id)
                .bind(url)
                .execute(p)
                .await
                .context("Failed to create block video")?
                .last_id()
        });
        Ok(BlockVideo {
            id,
            url: url.to_string(),
            block_id,
        })
    }

    async fn update(&self, video: &BlockVideo) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE block_videos SET url = ?, block_id = ? WHERE id = ? AND is_deleted = 0")
                .bind(&video.url)
                .bind(video.block_id)
                .bind(video.id)
                .execute(p)
                .await
                .context("Failed to update block video")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE block_videos SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete block video")?
                .rows_affected()
        });
        Ok(affected > 0)
    }
}
