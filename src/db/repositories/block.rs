//! Block repository
//!
//! Blocks form a tree through `parent_id` within one category. Reads join
//! the category names and the number of live children.

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::Block;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait BlockRepository: Send + Sync {
    /// Blocks without a parent in the category
    async fn list_roots(&self, category_id: i64) -> Result<Vec<Block>>;
    async fn list_children(&self, parent_id: i64) -> Result<Vec<Block>>;
    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Block>>;
    async fn list_all(&self) -> Result<Vec<Block>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Block>>;
    async fn create(&self, block: &Block) -> Result<i64>;
    async fn update(&self, block: &Block) -> Result<bool>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
    /// Whether `candidate` sits anywhere below `ancestor`
    async fn is_descendant(&self, ancestor: i64, candidate: i64) -> Result<bool>;
}

const SELECT: &str = "SELECT b.id, b.category_id, b.parent_id, b.name_en, b.name_ar, b.record_order, \
     b.url, b.is_active, b.is_visible, b.create_at, b.image1, b.image2, b.image3, \
     b.description_en, b.description_ar, b.description_en1, b.description_ar1, \
     b.description_en2, b.description_ar2, b.description_en3, b.description_ar3, \
     c.name_en AS category_name_en, c.name_ar AS category_name_ar, \
     (SELECT COUNT(*) FROM blocks ch WHERE ch.parent_id = b.id AND ch.is_deleted = 0) AS child_count \
     FROM blocks b LEFT JOIN block_categories c ON c.id = b.category_id \
     WHERE b.is_deleted = 0";

const ORDER: &str = "ORDER BY b.record_order, b.id";

pub struct SqlxBlockRepository {
    pool: DynDatabasePool,
}

impl SqlxBlockRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlockRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch(&self, filter: &str, arg: Option<i64>) -> Result<Vec<Block>> {
        let sql = format!("{} {} {}", SELECT, filter, ORDER);
        let blocks = with_pool!(self.pool, |p| {
            let mut query = sqlx::query_as::<_, Block>(&sql);
            if let Some(arg) = arg {
                query = query.bind(arg);
            }
            query.fetch_all(p).await.context("Failed to list blocks")?
        });
        Ok(blocks)
    }
}

#[async_trait]
impl BlockRepository for SqlxBlockRepository {
    async fn list_roots(&self, category_id: i64) -> Result<Vec<Block>> {
        self.fetch("AND b.category_id = ? AND b.parent_id IS NULL", Some(category_id))
            .await
    }

    async fn list_children(&self, parent_id: i64) -> Result<Vec<Block>> {
        self.fetch("AND b.parent_id = ?", Some(parent_id)).await
    }

    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Block>> {
        self.fetch("AND b.category_id = ?", Some(category_id)).await
    }

    async fn list_all(&self) -> Result<Vec<Block>> {
        self.fetch("", None).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Block>> {
        let sql = format!("{} AND b.id = ?", SELECT);
        let block = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Block>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get block")?
        });
        Ok(block)
    }

    async fn create(&self, block: &Block) -> Result<i64> {
        let sql = "INSERT INTO blocks (category_id, parent_id, name_en, name_ar, record_order, url, \
                   is_active, is_visible, create_at, image1, image2, image3, description_en, description_ar, \
                   description_en1, description_ar1, description_en2, description_ar2, description_en3, description_ar3) \
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
        let body = &block.body;
        let id = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(block.category_id)
                .bind(block.parent_id)
                .bind(&block.name_en)
                .bind(&block.name_ar)
                .bind(block.record_order)
                .bind(&block.url)
                .bind(block.is_active)
                .bind(block.is_visible)
                .bind(block.create_at)
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
                .execute(p)
                .await
                .context("Failed to create block")?
                .last_id()
        });
        Ok(id)
    }

    async fn update(&self, block: &Block) -> Result<bool> {
        let sql = "UPDATE blocks SET category_id = ?, parent_id = ?, name_en = ?, name_ar = ?, record_order = ?, \
                   url = ?, is_active = ?, is_visible = ?, create_at = ?, image1 = ?, image2 = ?, image3 = ?, \
                   description_en = ?, description_ar = ?, description_en1 = ?, description_ar1 = ?, \
                   description_en2 = ?, description_ar2 = ?, description_en3 = ?, description_ar3 = ? \
                   WHERE id = ? AND is_deleted = 0";
        let body = &block.body;
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(block.category_id)
                .bind(block.parent_id)
                .bind(&block.name_en)
                .bind(&block.name_ar)
                .bind(block.record_order)
                .bind(&block.url)
                .bind(block.is_active)
                .bind(block.is_visible)
                .bind(block.create_at)
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
                .bind(block.id)
                .execute(p)
                .await
                .context("Failed to update block")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE blocks SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete block")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn is_descendant(&self, ancestor: i64, candidate: i64) -> Result<bool> {
        // UNION (not UNION ALL) so a pre-existing loop still terminates
        let sql = "WITH RECURSIVE sub (id) AS ( \
                       SELECT id FROM blocks WHERE parent_id = ? \
                       UNION \
                       SELECT b.id FROM blocks b JOIN sub ON b.parent_id = sub.id \
                   ) SELECT COUNT(*) FROM sub WHERE id = ?";
        let count: i64 = with_pool!(self.pool, |p| {
            sqlx::query_scalar(sql)
                .bind(ancestor)
                .bind(candidate)
                .fetch_one(p)
                .await
                .context("Failed to walk block descendants")?
        });
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_block_category, migrated_pool};
    use crate::models::ContentBody;
    use chrono::Utc;

    fn block(category_id: i64, parent_id: Option<i64>, name: &str, order: i32) -> Block {
        Block {
            id: 0,
            category_id,
            parent_id,
            name_en: name.into(),
            name_ar: name.into(),
            record_order: order,
            url: None,
            is_active: true,
            is_visible: true,
            create_at: Utc::now(),
            body: ContentBody {
                description_en: Some(format!("{} body", name)),
                ..ContentBody::default()
            },
            category_name_en: None,
            category_name_ar: None,
            child_count: 0,
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let pool = migrated_pool().await;
        let cat = insert_block_category(&pool, "News").await;
        let repo = SqlxBlockRepository::new(pool);

        let id = repo.create(&block(cat, None, "Intro", 0)).await.unwrap();
        let found = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.name_en, "Intro");
        assert_eq!(found.category_name_en.as_deref(), Some("News"));
        assert_eq!(found.body.description_en.as_deref(), Some("Intro body"));
        assert_eq!(found.child_count, 0);
    }

    #[tokio::test]
    async fn test_roots_children_and_counts() {
        let pool = migrated_pool().await;
        let cat = insert_block_category(&pool, "News").await;
        let repo = SqlxBlockRepository::new(pool);

        let b = repo.create(&block(cat, None, "B", 2)).await.unwrap();
        let a = repo.create(&block(cat, None, "A", 1)).await.unwrap();
        let child = repo.create(&block(cat, Some(a), "A1", 0)).await.unwrap();

        let roots = repo.list_roots(cat).await.unwrap();
        assert_eq!(roots.iter().map(|r| r.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(roots[0].child_count, 1);

        let children = repo.list_children(a).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child);

        assert_eq!(repo.list_by_category(cat).await.unwrap().len(), 3);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_soft_delete_updates_child_count() {
        let pool = migrated_pool().await;
        let cat = insert_block_category(&pool, "News").await;
        let repo = SqlxBlockRepository::new(pool);

        let parent = repo.create(&block(cat, None, "P", 0)).await.unwrap();
        let child = repo.create(&block(cat, Some(parent), "C", 0)).await.unwrap();

        assert!(repo.soft_delete(child).await.unwrap());
        assert_eq!(repo.get_by_id(parent).await.unwrap().unwrap().child_count, 0);
        assert!(repo.get_by_id(child).await.unwrap().is_none());
        assert!(!repo.soft_delete(child).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_descendant_walks_whole_subtree() {
        let pool = migrated_pool().await;
        let cat = insert_block_category(&pool, "News").await;
        let repo = SqlxBlockRepository::new(pool);

        let root = repo.create(&block(cat, None, "R", 0)).await.unwrap();
        let mid = repo.create(&block(cat, Some(root), "M", 0)).await.unwrap();
        let leaf = repo.create(&block(cat, Some(mid), "L", 0)).await.unwrap();
        let other = repo.create(&block(cat, None, "O", 0)).await.unwrap();

        assert!(repo.is_descendant(root, leaf).await.unwrap());
        assert!(repo.is_descendant(root, mid).await.unwrap());
        assert!(!repo.is_descendant(leaf, root).await.unwrap());
        assert!(!repo.is_descendant(root, other).await.unwrap());
        assert!(!repo.is_descendant(root, root).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_moves_block() {
        let pool = migrated_pool().await;
        let cat = insert_block_category(&pool, "News").await;
        let repo = SqlxBlockRepository::new(pool);

        let a = repo.create(&block(cat, None, "A", 0)).await.unwrap();
        let b = repo.create(&block(cat, None, "B", 0)).await.unwrap();

        let mut moved = repo.get_by_id(b).await.unwrap().unwrap();
        moved.parent_id = Some(a);
        moved.name_en = "B2".into();
        assert!(repo.update(&moved).await.unwrap());

        let found = repo.get_by_id(b).await.unwrap().unwrap();
        assert_eq!(found.parent_id, Some(a));
        assert_eq!(found.name_en, "B2");
    }
}
