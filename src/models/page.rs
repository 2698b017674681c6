//! Page, page photo and page attachment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::ContentBody;
use super::lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: i64,
    pub menu_id: Option<i64>,
    pub name_en: String,
    pub name_ar: String,
    pub record_order: i32,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub page_type: Option<String>,
    pub is_active: bool,
    pub image: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub body: ContentBody,
    pub create_at: DateTime<Utc>,
    pub menu_name_en: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub menu_id: Option<i64>,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default, deserialize_with = "lenient::int_or_zero")]
    pub record_order: i32,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub url: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::optional_text")]
    pub page_type: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub body: ContentBody,
    #[serde(default, deserialize_with = "lenient::optional_datetime", alias = "CreateAt")]
    pub create_at: Option<DateTime<Utc>>,
}

/// Optional `?menuId=` filter for the page list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageListQuery {
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub menu_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PagePhoto {
    pub id: i64,
    pub image: String,
    pub page_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePhotoInput {
    #[serde(default)]
    pub image: String,
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub page_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PageAttachment {
    pub id: i64,
    pub file: String,
    pub name: String,
    pub page_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAttachmentInput {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub page_id: i64,
}
