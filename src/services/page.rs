//! Page services
//!
//! Flat content pages, optionally attached to a menu entry, with photo and
//! attachment children.

use crate::db::repositories::{
    MenuRepository, PageAttachmentRepository, PagePhotoRepository, PageRepository,
};
use crate::models::{
    Page, PageAttachment, PageAttachmentInput, PageInput, PagePhoto, PagePhotoInput,
};
use crate::services::error::ContentError;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct PageService {
    page_repo: Arc<dyn PageRepository>,
    menu_repo: Arc<dyn MenuRepository>,
}

impl PageService {
    pub fn new(page_repo: Arc<dyn PageRepository>, menu_repo: Arc<dyn MenuRepository>) -> Self {
        Self { page_repo, menu_repo }
    }

    pub async fn list(&self, menu_id: Option<i64>) -> Result<Vec<Page>, ContentError> {
        Ok(self.page_repo.list(menu_id).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Page, ContentError> {
        self.page_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::record_not_found(id))
    }

    pub async fn create(&self, input: PageInput) -> Result<Page, ContentError> {
        let page = page_from_input(0, input, None)?;
        self.check_menu(page.menu_id).await?;
        let id = self.page_repo.create(&page).await?;
        tracing::info!(page_id = id, "Page created");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, input: PageInput) -> Result<Page, ContentError> {
        if input.id != id {
            return Err(ContentError::ids_not_matching());
        }
        let existing = self.get(id).await?;
        let page = page_from_input(id, input, Some(existing.create_at))?;
        self.check_menu(page.menu_id).await?;
        if !self.page_repo.update(&page).await? {
            return Err(ContentError::record_not_found(id));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        if !self.page_repo.soft_delete(id).await? {
            return Err(ContentError::record_not_found(id));
        }
        Ok(())
    }

    async fn check_menu(&self, menu_id: Option<i64>) -> Result<(), ContentError> {
        if let Some(menu_id) = menu_id {
            if self.menu_repo.get_by_id(menu_id).await?.is_none() {
                return Err(ContentError::Validation(format!(
                    "Menu with Id = {} does not exist",
                    menu_id
                )));
            }
        }
        Ok(())
    }
}

fn page_from_input(
    id: i64,
    input: PageInput,
    existing_create_at: Option<DateTime<Utc>>,
) -> Result<Page, ContentError> {
    let name_en = input.name_en.trim().to_string();
    let name_ar = input.name_ar.trim().to_string();
    if name_en.is_empty() && name_ar.is_empty() {
        return Err(ContentError::validation("Name is required"));
    }

    Ok(Page {
        id,
        menu_id: input.menu_id,
        name_en,
        name_ar,
        record_order: input.record_order,
        url: input.url,
        page_type: input.page_type,
        is_active: input.is_active,
        image: input.image,
        body: input.body,
        create_at: input
            .create_at
            .or(existing_create_at)
            .unwrap_or_else(Utc::now),
        menu_name_en: None,
    })
}

async fn require_page(repo: &Arc<dyn PageRepository>, page_id: i64) -> Result<(), ContentError> {
    if repo.get_by_id(page_id).await?.is_none() {
        return Err(ContentError::Validation(format!(
            "Page with Id = {} does not exist",
            page_id
        )));
    }
    Ok(())
}

pub struct PagePhotoService {
    photo_repo: Arc<dyn PagePhotoRepository>,
    page_repo: Arc<dyn PageRepository>,
}

impl PagePhotoService {
    pub fn new(photo_repo: Arc<dyn PagePhotoRepository>, page_repo: Arc<dyn PageRepository>) -> Self {
        Self { photo_repo, page_repo }
    }

    pub async fn list_by_page(&self, page_id: i64) -> Result<Vec<PagePhoto>, ContentError> {
        Ok(self.photo_repo.list_by_page(page_id).await?)
    }

    pub async fn create(&self, input: PagePhotoInput) -> Result<PagePhoto, ContentError> {
        let image = input.image.trim();
        if image.is_empty() {
            return Err(ContentError::validation("Image is required"));
        }
        require_page(&self.page_repo, input.page_id).await?;
        Ok(self.photo_repo.create(input.page_id, image).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        if !self.photo_repo.soft_delete(id).await? {
            return Err(ContentError::record_not_found(id));
        }
        Ok(())
    }
}

pub struct PageAttachmentService {
    attachment_repo: Arc<dyn PageAttachmentRepository>,
    page_repo: Arc<dyn PageRepository>,
}

impl PageAttachmentService {
    pub fn new(
        attachment_repo: Arc<dyn PageAttachmentRepository>,
        page_repo: Arc<dyn PageRepository>,
    ) -> Self {
        Self {
            attachment_repo,
            page_repo,
        }
    }

    pub async fn list_by_page(&self, page_id: i64) -> Result<Vec<PageAttachment>, ContentError> {
        Ok(self.attachment_repo.list_by_page(page_id).await?)
    }

    /// A blank display name falls back to the stored file name
    pub async fn create(&self, input: PageAttachmentInput) -> Result<PageAttachment, ContentError> {
        let file = input.file.trim();
        if file.is_empty() {
            return Err(ContentError::validation("File is required"));
        }
        let name = match input.name.trim() {
            "" => file,
            name => name,
        };
        require_page(&self.page_repo, input.page_id).await?;
        Ok(self.attachment_repo.create(input.page_id, file, name).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        if !self.attachment_repo.soft_delete(id).await? {
            return Err(ContentError::record_not_found(id));
        }
        Ok(())
    }
}
