//! Block services
//!
//! Block categories (cached list), hierarchical blocks, and the photos and
//! videos hanging off a block.
//!
//! Parent invariants for a block:
//! - the parent exists and lives in the same category
//! - the parent is neither the block itself nor one of its descendants
//! - a block with live children stays in its category

use crate::cache::{Cache, CachedList};
use crate::db::repositories::{
    BlockCategoryRepository, BlockPhotoRepository, BlockRepository, BlockVideoRepository,
};
use crate::models::{
    build_tree, Block, BlockCategory, BlockCategoryInput, BlockInput, BlockPhoto, BlockPhotoInput,
    BlockTree, BlockType, BlockVideo, BlockVideoInput,
};
use crate::services::error::ContentError;
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;

const CACHE_NAMESPACE: &str = "block_categories";

pub struct BlockCategoryService {
    repo: Arc<dyn BlockCategoryRepository>,
    cached: CachedList<Vec<BlockCategory>>,
}

impl BlockCategoryService {
    pub fn new(repo: Arc<dyn BlockCategoryRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cached: CachedList::new(cache, CACHE_NAMESPACE),
        }
    }

    pub async fn list(&self) -> Result<Vec<BlockCategory>, ContentError> {
        self.cached
            .get_or_load(|| async { self.repo.list().await.map_err(ContentError::from) })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<BlockCategory, ContentError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::record_not_found(id))
    }

    pub async fn create(&self, input: BlockCategoryInput) -> Result<BlockCategory, ContentError> {
        let category = category_from_input(0, input)?;
        let created = self.repo.create(&category).await?;
        self.invalidate_cache().await;
        tracing::info!(category_id = created.id, block_type = %created.block_type, "Block category created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: BlockCategoryInput) -> Result<BlockCategory, ContentError> {
        if input.id != id {
            return Err(ContentError::ids_not_matching());
        }
        let category = category_from_input(id, input)?;
        if !self.repo.update(&category).await? {
            return Err(ContentError::record_not_found(id));
        }
        self.invalidate_cache().await;
        Ok(category)
    }

    /// Soft delete, refused while live blocks remain in the category
    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        self.get(id).await?;
        let blocks = self.repo.block_count(id).await?;
        if blocks > 0 {
            return Err(ContentError::Validation(format!(
                "Category still contains {} blocks and cannot be deleted",
                blocks
            )));
        }
        self.repo.soft_delete(id).await?;
        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        self.cached.invalidate().await;
    }
}

fn category_from_input(id: i64, input: BlockCategoryInput) -> Result<BlockCategory, ContentError> {
    let name_ar = input.name_ar.trim().to_string();
    let name_en = input.name_en.trim().to_string();
    if name_ar.is_empty() || name_en.is_empty() {
        return Err(ContentError::validation("Arabic and English names are required"));
    }
    let block_type = BlockType::from_str(&input.block_type).map_err(ContentError::Validation)?;
    Ok(BlockCategory {
        id,
        name_ar,
        name_en,
        block_type: block_type.to_string(),
        is_active: input.is_active,
    })
}

pub struct BlockService {
    block_repo: Arc<dyn BlockRepository>,
    category_repo: Arc<dyn BlockCategoryRepository>,
}

impl BlockService {
    pub fn new(
        block_repo: Arc<dyn BlockRepository>,
        category_repo: Arc<dyn BlockCategoryRepository>,
    ) -> Self {
        Self {
            block_repo,
            category_repo,
        }
    }

    /// Children of `block_id` when given, otherwise the category's roots
    pub async fn get_master(
        &self,
        category_id: Option<i64>,
        block_id: Option<i64>,
    ) -> Result<Vec<Block>, ContentError> {
        match (block_id, category_id) {
            (Some(parent), _) => Ok(self.block_repo.list_children(parent).await?),
            (None, Some(category)) => Ok(self.block_repo.list_roots(category).await?),
            (None, None) => Err(ContentError::validation("categoryId or blockId is required")),
        }
    }

    /// Every live block, for parent pickers
    pub async fn list_all(&self) -> Result<Vec<Block>, ContentError> {
        Ok(self.block_repo.list_all().await?)
    }

    pub async fn tree(&self, category_id: i64) -> Result<Vec<BlockTree>, ContentError> {
        Ok(build_tree(self.block_repo.list_by_category(category_id).await?))
    }

    pub async fn get(&self, id: i64) -> Result<Block, ContentError> {
        self.block_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::record_not_found(id))
    }

    pub async fn create(&self, input: BlockInput) -> Result<Block, ContentError> {
        let block = block_from_input(0, input, None)?;
        self.check_category(block.category_id).await?;
        self.check_parent(None, block.category_id, block.parent_id).await?;

        let id = self.block_repo.create(&block).await?;
        tracing::info!(block_id = id, category_id = block.category_id, "Block created");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, input: BlockInput) -> Result<Block, ContentError> {
        if input.id != id {
            return Err(ContentError::ids_not_matching());
        }
        let existing = self.get(id).await?;
        let block = block_from_input(id, input, Some(existing.create_at))?;
        self.check_category(block.category_id).await?;
        if block.category_id != existing.category_id && existing.child_count > 0 {
            return Err(ContentError::Validation(format!(
                "Block has {} child blocks and cannot move to another category",
                existing.child_count
            )));
        }
        self.check_parent(Some(id), block.category_id, block.parent_id).await?;

        if !self.block_repo.update(&block).await? {
            return Err(ContentError::record_not_found(id));
        }
        self.get(id).await
    }

    /// Soft delete, refused while live child blocks exist
    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        let block = self.get(id).await?;
        if block.child_count > 0 {
            return Err(ContentError::Validation(format!(
                "Block has {} child blocks and cannot be deleted",
                block.child_count
            )));
        }
        self.block_repo.soft_delete(id).await?;
        Ok(())
    }

    async fn check_category(&self, category_id: i64) -> Result<(), ContentError> {
        if self.category_repo.get_by_id(category_id).await?.is_none() {
            return Err(ContentError::Validation(format!(
                "Block category with Id = {} does not exist",
                category_id
            )));
        }
        Ok(())
    }

    async fn check_parent(
        &self,
        id: Option<i64>,
        category_id: i64,
        parent_id: Option<i64>,
    ) -> Result<(), ContentError> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        if id == Some(parent_id) {
            return Err(ContentError::validation("A block cannot be its own parent"));
        }
        let parent = self.block_repo.get_by_id(parent_id).await?.ok_or_else(|| {
            ContentError::Validation(format!("Parent block with Id = {} does not exist", parent_id))
        })?;
        if parent.category_id != category_id {
            return Err(ContentError::validation("Parent block belongs to another category"));
        }
        if let Some(id) = id {
            if self.block_repo.is_descendant(id, parent_id).await? {
                return Err(ContentError::validation(
                    "A block cannot be moved under one of its own descendants",
                ));
            }
        }
        Ok(())
    }
}

fn block_from_input(
    id: i64,
    input: BlockInput,
    existing_create_at: Option<chrono::DateTime<Utc>>,
) -> Result<Block, ContentError> {
    let name_en = input.name_en.trim().to_string();
    let name_ar = input.name_ar.trim().to_string();
    if name_en.is_empty() && name_ar.is_empty() {
        return Err(ContentError::validation("Name is required"));
    }
    if input.category_id == 0 {
        return Err(ContentError::validation("categoryId is required"));
    }

    Ok(Block {
        id,
        category_id: input.category_id,
        parent_id: input.parent_id,
        name_en,
        name_ar,
        record_order: input.record_order,
        url: input.url,
        is_active: input.is_active,
        is_visible: input.is_visible,
        create_at: input
            .create_at
            .or(existing_create_at)
            .unwrap_or_else(Utc::now),
        body: input.body,
        category_name_en: None,
        category_name_ar: None,
        child_count: 0,
    })
}

/// Both media services check the owning block the same way
async fn require_block(repo: &Arc<dyn BlockRepository>, block_id: i64) -> Result<(), ContentError> {
    if repo.get_by_id(block_id).await?.is_none() {
        return Err(ContentError::Validation(format!(
            "Block with Id = {} does not exist",
            block_id
        )));
    }
    Ok(())
}

pub struct BlockPhotoService {
    photo_repo: Arc<dyn BlockPhotoRepository>,
    block_repo: Arc<dyn BlockRepository>,
}

impl BlockPhotoService {
    pub fn new(photo_repo: Arc<dyn BlockPhotoRepository>, block_repo: Arc<dyn BlockRepository>) -> Self {
        Self {
            photo_repo,
            block_repo,
        }
    }

    pub async fn list_by_block(&self, block_id: i64) -> Result<Vec<BlockPhoto>, ContentError> {
        Ok(self.photo_repo.list_by_block(block_id).await?)
    }

    pub async fn create(&self, input: BlockPhotoInput) -> Result<BlockPhoto, ContentError> {
        let image = input.image.trim();
        if image.is_empty() {
            return Err(ContentError::validation("Image is required"));
        }
        require_block(&self.block_repo, input.block_id).await?;
        Ok(self.photo_repo.create(input.block_id, image).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        if !self.photo_repo.soft_delete(id).await? {
            return Err(ContentError::record_not_found(id));
        }
        Ok(())
    }
}

pub struct BlockVideoService {
    video_repo: Arc<dyn BlockVideoRepository>,
    block_repo: Arc<dyn BlockRepository>,
}

impl BlockVideoService {
    pub fn new(video_repo: Arc<dyn BlockVideoRepository>, block_repo: Arc<dyn BlockRepository>) -> Self {
        Self {
            video_repo,
            block_repo,
        }
    }

    pub async fn get(&self, id: i64) -> Result<BlockVideo, ContentError> {
        self.video_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::record_not_found(id))
    }

    pub async fn list_by_block(&self, block_id: i64) -> Result<Vec<BlockVideo>, ContentError> {
        Ok(self.video_repo.list_by_block(block_id).await?)
    }

    pub async fn create(&self, input: BlockVideoInput) -> Result<BlockVideo, ContentError> {
        let url = input.url.trim();
        if url.is_empty() {
            return Err(ContentError::validation("Video url is required"));
        }
        require_block(&self.block_repo, input.block_id).await?;
        Ok(self.video_repo.create(input.block_id, url).await?)
    }

    pub async fn update(&self, id: i64, input: BlockVideoInput) -> Result<BlockVideo, ContentError> {
        if input.id != id {
            return Err(ContentError::ids_not_matching());
        }
        let mut video = self.get(id).await?;
        let url = input.url.trim();
        if url.is_empty() {
            return Err(ContentError::validation("Video url is required"));
        }
        if input.block_id != 0 && input.block_id != video.block_id {
            require_block(&self.block_repo, input.block_id).await?;
            video.block_id = input.block_id;
        }
        video.url = url.to_string();

        if !self.video_repo.update(&video).await? {
            return Err(ContentError::record_not_found(id));
        }
        Ok(video)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        if !self.video_repo.soft_delete(id).await? {
            return Err(ContentError::record_not_found(id));
        }
        Ok(())
    }
}
