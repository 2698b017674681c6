//! Block, block category and block media models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::lenient;
use super::tree::{TreeItem, TreeNode};

/// Kind of content a block category holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockType {
    Blog,
    Link,
    PhotoGallery,
    VideoGallery,
    HomeSlider,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockType::Blog => "Blog",
            BlockType::Link => "Link",
            BlockType::PhotoGallery => "PhotoGallery",
            BlockType::VideoGallery => "VideoGallery",
            BlockType::HomeSlider => "HomeSlider",
        };
        f.write_str(s)
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blog" => Ok(BlockType::Blog),
            "link" => Ok(BlockType::Link),
            "photogallery" => Ok(BlockType::PhotoGallery),
            "videogallery" => Ok(BlockType::VideoGallery),
            "homeslider" => Ok(BlockType::HomeSlider),
            _ => Err(format!("Unknown block type: {}", s)),
        }
    }
}

/// Images and bilingual descriptions shared by blocks and pages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContentBody {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub image1: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub image2: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub image3: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description_en: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description_ar: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description_en1: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description_ar1: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description_en2: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description_ar2: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description_en3: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description_ar3: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlockCategory {
    pub id: i64,
    pub name_ar: String,
    pub name_en: String,
    pub block_type: String,
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockCategoryInput {
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub id: i64,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub block_type: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Block row with its category names and live child count joined in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: i64,
    pub category_id: i64,
    pub parent_id: Option<i64>,
    pub name_en: String,
    pub name_ar: String,
    pub record_order: i32,
    pub url: Option<String>,
    pub is_active: bool,
    pub is_visible: bool,
    pub create_at: DateTime<Utc>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub body: ContentBody,
    pub category_name_en: Option<String>,
    pub category_name_ar: Option<String>,
    pub child_count: i64,
}

impl TreeItem for Block {
    fn node_id(&self) -> i64 {
        self.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    fn sort_key(&self) -> (i32, i64) {
        (self.record_order, self.id)
    }
}

pub type BlockTree = TreeNode<Block>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInput {
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub id: i64,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub category_id: i64,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub parent_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int_or_zero")]
    pub record_order: i32,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default, deserialize_with = "lenient::optional_datetime", alias = "CreateAt")]
    pub create_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub body: ContentBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlockPhoto {
    pub id: i64,
    pub image: String,
    pub block_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPhotoInput {
    #[serde(default)]
    pub image: String,
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub block_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlockVideo {
    pub id: i64,
    pub url: String,
    pub block_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockVideoInput {
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub id: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub block_id: i64,
}
