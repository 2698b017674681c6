//! Menu repository

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::Menu;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Where a menu entry renders on the public site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuLocation {
    Home,
    Footer,
}

#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn list_roots(&self, category_id: i64) -> Result<Vec<Menu>>;
    async fn list_children(&self, parent_id: i64) -> Result<Vec<Menu>>;
    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Menu>>;
    async fn list_all(&self) -> Result<Vec<Menu>>;
    /// Active entries flagged for a location (`is_home_footer` counts for both)
    async fn list_for_location(&self, location: MenuLocation) -> Result<Vec<Menu>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Menu>>;
    async fn create(&self, menu: &Menu) -> Result<i64>;
    async fn update(&self, menu: &Menu) -> Result<bool>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
    async fn is_descendant(&self, ancestor: i64, candidate: i64) -> Result<bool>;
}

const SELECT: &str = "SELECT m.id, m.category_id, m.parent_id, m.name_en, m.name_ar, m.level_order, m.url, \
     m.menu_type, m.is_active, m.is_home, m.is_footer, m.is_home_footer, m.image, m.file, \
     m.description_en, m.description_ar, \
     (SELECT COUNT(*) FROM menus ch WHERE ch.parent_id = m.id AND ch.is_deleted = 0) AS child_count \
     FROM menus m WHERE m.is_deleted = 0";

const ORDER: &str = "ORDER BY m.level_order, m.id";

pub struct SqlxMenuRepository {
    pool: DynDatabasePool,
}

impl SqlxMenuRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MenuRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch(&self, filter: &str, arg: Option<i64>) -> Result<Vec<Menu>> {
        let sql = format!("{} {} {}", SELECT, filter, ORDER);
        let menus = with_pool!(self.pool, |p| {
            let mut query = sqlx::query_as::<_, Menu>(&sql);
            if let Some(arg) = arg {
                query = query.bind(arg);
            }
            query.fetch_all(p).await.context("Failed to list menus")?
        });
        Ok(menus)
    }
}

#[async_trait]
impl MenuRepository for SqlxMenuRepository {
    async fn list_roots(&self, category_id: i64) -> Result<Vec<Menu>> {
        self.fetch("AND m.category_id = ? AND m.parent_id IS NULL", Some(category_id))
            .await
    }

    async fn list_children(&self, parent_id: i64) -> Result<Vec<Menu>> {
        self.fetch("AND m.parent_id = ?", Some(parent_id)).await
    }

    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Menu>> {
        self.fetch("AND m.category_id = ?", Some(category_id)).await
    }

    async fn list_all(&self) -> Result<Vec<Menu>> {
        self.fetch("", None).await
    }

    async fn list_for_location(&self, location: MenuLocation) -> Result<Vec<Menu>> {
        let filter = match location {
            MenuLocation::Home => "AND m.is_active = 1 AND (m.is_home = 1 OR m.is_home_footer = 1)",
            MenuLocation::Footer => "AND m.is_active = 1 AND (m.is_footer = 1 OR m.is_home_footer = 1)",
        };
        self.fetch(filter, None).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Menu>> {
        let sql = format!("{} AND m.id = ?", SELECT);
        let menu = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Menu>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get menu")?
        });
        Ok(menu)
    }

    async fn create(&self, menu: &Menu) -> Result<i64> {
        let sql = "INSERT INTO menus (category_id, parent_id, name_en, name_ar, level_order, url, menu_type, \
                   is_active, is_home, is_footer, is_home_footer, image, file, description_en, description_ar) \
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
        let id = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(menu.category_id)
                .bind(menu.parent_id)
                .bind(&menu.name_en)
                .bind(&menu.name_ar)
                .bind(menu.level_order)
                .bind(&menu.url)
                .bind(&menu.menu_type)
                .bind(menu.is_active)
                .bind(menu.is_home)
                .bind(menu.is_footer)
                .bind(menu.is_home_footer)
                .bind(&menu.image)
                .bind(&menu.file)
                .bind(&menu.description_en)
                .bind(&menu.description_ar)
                .execute(p)
                .await
                .context("Failed to create menu")?
                .last_id()
        });
        Ok(id)
    }

    async fn update(&self, menu: &Menu) -> Result<bool> {
        let sql = "UPDATE menus SET category_id = ?, parent_id = ?, name_en = ?, name_ar = ?, level_order = ?, \
                   url = ?, menu_type = ?, is_active = ?, is_home = ?, is_footer = ?, is_home_footer = ?, \
                   image = ?, file = ?, description_en = ?, description_ar = ? \
                   WHERE id = ? AND is_deleted = 0";
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(menu.category_id)
                .bind(menu.parent_id)
                .bind(&menu.name_en)
                .bind(&menu.name_ar)
                .bind(menu.level_order)
                .bind(&menu.url)
                .bind(&menu.menu_type)
                .bind(menu.is_active)
                .bind(menu.is_home)
                .bind(menu.is_footer)
                .bind(menu.is_home_footer)
                .bind(&menu.image)
                .bind(&menu.file)
                .bind(&menu.description_en)
                .bind(&menu.description_ar)
                .bind(menu.id)
                .execute(p)
                .await
                .context("Failed to update menu")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE menus SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete menu")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn is_descendant(&self, ancestor: i64, candidate: i64) -> Result<bool> {
        let sql = "WITH RECURSIVE sub (id) AS ( \
                       SELECT id FROM menus WHERE parent_id = ? \
                       UNION \
                       SELECT m.id FROM menus m JOIN sub ON m.parent_id = sub.id \
                   ) SELECT COUNT(*) FROM sub WHERE id = ?";
        let count: i64 = with_pool!(self.pool, |p| {
            sqlx::query_scalar(sql)
                .bind(ancestor)
                .bind(candidate)
                .fetch_one(p)
                .await
                .context("Failed to walk menu descendants")?
        });
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_menu_category, migrated_pool};

    fn menu(category_id: i64, parent_id: Option<i64>, name: &str, order: i32) -> Menu {
        Menu {
            id: 0,
            category_id,
            parent_id,
            name_en: name.into(),
            name_ar: name.into(),
            level_order: order,
            url: Some(format!("/{}", name.to_lowercase())),
            menu_type: Some("Page".into()),
            is_active: true,
            is_home: false,
            is_footer: false,
            is_home_footer: false,
            image: None,
            file: None,
            description_en: None,
            description_ar: None,
            child_count: 0,
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let pool = migrated_pool().await;
        let cat = insert_menu_category(&pool, "Main").await;
        let repo = SqlxMenuRepository::new(pool);

        let id = repo.create(&menu(cat, None, "About", 0)).await.unwrap();
        let found = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.url.as_deref(), Some("/about"));
        assert_eq!(found.menu_type.as_deref(), Some("Page"));
    }

    #[tokio::test]
    async fn test_locations() {
        let pool = migrated_pool().await;
        let cat = insert_menu_category(&pool, "Main").await;
        let repo = SqlxMenuRepository::new(pool);

        let mut home = menu(cat, None, "Home", 0);
        home.is_home = true;
        let mut footer = menu(cat, None, "Privacy", 1);
        footer.is_footer = true;
        let mut both = menu(cat, None, "Contact", 2);
        both.is_home_footer = true;
        let mut hidden = menu(cat, None, "Old", 3);
        hidden.is_home = true;
        hidden.is_active = false;
        for m in [&home, &footer, &both, &hidden] {
            repo.create(m).await.unwrap();
        }

        let names = |menus: Vec<Menu>| menus.into_iter().map(|m| m.name_en).collect::<Vec<_>>();
        assert_eq!(names(repo.list_for_location(MenuLocation::Home).await.unwrap()), vec!["Home", "Contact"]);
        assert_eq!(names(repo.list_for_location(MenuLocation::Footer).await.unwrap()), vec!["Privacy", "Contact"]);
    }

    #[tokio::test]
    async fn test_tree_queries() {
        let pool = migrated_pool().await;
        let cat = insert_menu_category(&pool, "Main").await;
        let repo = SqlxMenuRepository::new(pool);

        let root = repo.create(&menu(cat, None, "Services", 0)).await.unwrap();
        let child = repo.create(&menu(cat, Some(root), "Design", 0)).await.unwrap();
        let grandchild = repo.create(&menu(cat, Some(child), "Logos", 0)).await.unwrap();

        assert_eq!(repo.list_roots(cat).await.unwrap().len(), 1);
        assert_eq!(repo.list_children(root).await.unwrap()[0].id, child);
        assert_eq!(repo.get_by_id(root).await.unwrap().unwrap().child_count, 1);
        assert!(repo.is_descendant(root, grandchild).await.unwrap());
        assert!(!repo.is_descendant(grandchild, root).await.unwrap());

        assert!(repo.soft_delete(grandchild).await.unwrap());
        assert_eq!(repo.list_by_category(cat).await.unwrap().len(), 2);
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }
}
