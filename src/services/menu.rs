//! Menu services
//!
//! Menu categories share the cached-list treatment of block categories;
//! menus follow the same parent rules as blocks.

use crate::cache::{Cache, CachedList};
use crate::db::repositories::{MenuCategoryRepository, MenuLocation, MenuRepository};
use crate::models::{build_tree, Menu, MenuCategory, MenuCategoryInput, MenuInput, MenuTree};
use crate::services::error::ContentError;
use std::sync::Arc;

const CACHE_NAMESPACE: &str = "menu_categories";

pub struct MenuCategoryService {
    repo: Arc<dyn MenuCategoryRepository>,
    cached: CachedList<Vec<MenuCategory>>,
}

impl MenuCategoryService {
    pub fn new(repo: Arc<dyn MenuCategoryRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cached: CachedList::new(cache, CACHE_NAMESPACE),
        }
    }

    pub async fn list(&self) -> Result<Vec<MenuCategory>, ContentError> {
        self.cached
            .get_or_load(|| async { self.repo.list().await.map_err(ContentError::from) })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<MenuCategory, ContentError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::record_not_found(id))
    }

    pub async fn create(&self, input: MenuCategoryInput) -> Result<MenuCategory, ContentError> {
        let created = self.repo.create(&category_from_input(0, input)?).await?;
        self.cached.invalidate().await;
        tracing::info!(category_id = created.id, "Menu category created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: MenuCategoryInput) -> Result<MenuCategory, ContentError> {
        if input.id != id {
            return Err(ContentError::ids_not_matching());
        }
        let category = category_from_input(id, input)?;
        if !self.repo.update(&category).await? {
            return Err(ContentError::record_not_found(id));
        }
        self.cached.invalidate().await;
        Ok(category)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        self.get(id).await?;
        let menus = self.repo.menu_count(id).await?;
        if menus > 0 {
            return Err(ContentError::Validation(format!(
                "Category still contains {} menus and cannot be deleted",
                menus
            )));
        }
        self.repo.soft_delete(id).await?;
        self.cached.invalidate().await;
        Ok(())
    }
}

fn category_from_input(id: i64, input: MenuCategoryInput) -> Result<MenuCategory, ContentError> {
    let name_ar = input.name_ar.trim().to_string();
    let name_en = input.name_en.trim().to_string();
    if name_ar.is_empty() || name_en.is_empty() {
        return Err(ContentError::validation("Arabic and English names are required"));
    }
    Ok(MenuCategory {
        id,
        name_ar,
        name_en,
        is_visible_user: input.is_visible_user,
        is_active: input.is_active,
    })
}

pub struct MenuService {
    menu_repo: Arc<dyn MenuRepository>,
    category_repo: Arc<dyn MenuCategoryRepository>,
}

impl MenuService {
    pub fn new(menu_repo: Arc<dyn MenuRepository>, category_repo: Arc<dyn MenuCategoryRepository>) -> Self {
        Self {
            menu_repo,
            category_repo,
        }
    }

    /// Children of `menu_id` when given, otherwise the category's roots
    pub async fn get_master(
        &self,
        category_id: Option<i64>,
        menu_id: Option<i64>,
    ) -> Result<Vec<Menu>, ContentError> {
        match (menu_id, category_id) {
            (Some(parent), _) => Ok(self.menu_repo.list_children(parent).await?),
            (None, Some(category)) => Ok(self.menu_repo.list_roots(category).await?),
            (None, None) => Err(ContentError::validation("categoryId or menuId is required")),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Menu>, ContentError> {
        Ok(self.menu_repo.list_all().await?)
    }

    pub async fn tree(&self, category_id: i64) -> Result<Vec<MenuTree>, ContentError> {
        Ok(build_tree(self.menu_repo.list_by_category(category_id).await?))
    }

    /// Active entries for the home page or the footer
    pub async fn for_location(&self, location: MenuLocation) -> Result<Vec<Menu>, ContentError> {
        Ok(self.menu_repo.list_for_location(location).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Menu, ContentError> {
        self.menu_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::record_not_found(id))
    }

    pub async fn create(&self, input: MenuInput) -> Result<Menu, ContentError> {
        let menu = menu_from_input(0, input)?;
        self.check_category(menu.category_id).await?;
        self.check_parent(None, menu.category_id, menu.parent_id).await?;

        let id = self.menu_repo.create(&menu).await?;
        tracing::info!(menu_id = id, category_id = menu.category_id, "Menu created");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, input: MenuInput) -> Result<Menu, ContentError> {
        if input.id != id {
            return Err(ContentError::ids_not_matching());
        }
        let existing = self.get(id).await?;
        let menu = menu_from_input(id, input)?;
        self.check_category(menu.category_id).await?;
        if menu.category_id != existing.category_id && existing.child_count > 0 {
            return Err(ContentError::Validation(format!(
                "Menu has {} child menus and cannot move to another category",
                existing.child_count
            )));
        }
        self.check_parent(Some(id), menu.category_id, menu.parent_id).await?;

        if !self.menu_repo.update(&menu).await? {
            return Err(ContentError::record_not_found(id));
        }
        self.get(id).await
    }

    /// Soft delete, refused while live child menus exist
    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        let menu = self.get(id).await?;
        if menu.child_count > 0 {
            return Err(ContentError::Validation(format!(
                "Menu has {} child menus and cannot be deleted",
                menu.child_count
            )));
        }
        self.menu_repo.soft_delete(id).await?;
        Ok(())
    }

    async fn check_category(&self, category_id: i64) -> Result<(), ContentError> {
        if self.category_repo.get_by_id(category_id).await?.is_none() {
            return Err(ContentError::Validation(format!(
                "Menu category with Id = {} does not exist",
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
            return Err(ContentError::validation("A menu cannot be its own parent"));
        }
        let parent = self.menu_repo.get_by_id(parent_id).await?.ok_or_else(|| {
            ContentError::Validation(format!("Parent menu with Id = {} does not exist", parent_id))
        })?;
        if parent.category_id != category_id {
            return Err(ContentError::validation("Parent menu belongs to another category"));
        }
        if let Some(id) = id {
            if self.menu_repo.is_descendant(id, parent_id).await? {
                return Err(ContentError::validation(
                    "A menu cannot be moved under one of its own descendants",
                ));
            }
        }
        Ok(())
    }
}

fn menu_from_input(id: i64, input: MenuInput) -> Result<Menu, ContentError> {
    let name_en = input.name_en.trim().to_string();
    let name_ar = input.name_ar.trim().to_string();
    if name_en.is_empty() && name_ar.is_empty() {
        return Err(ContentError::validation("Name is required"));
    }
    if input.category_id == 0 {
        return Err(ContentError::validation("categoryId is required"));
    }

    Ok(Menu {
        id,
        category_id: input.category_id,
        parent_id: input.parent_id,
        name_en,
        name_ar,
        level_order: input.level_order,
        url: input.url,
        menu_type: input.menu_type,
        is_active: input.is_active,
        is_home: input.is_home,
        is_footer: input.is_footer,
        is_home_footer: input.is_home_footer,
        image: input.image,
        file: input.file,
        description_en: input.description_en,
        description_ar: input.description_ar,
        child_count: 0,
    })
}
