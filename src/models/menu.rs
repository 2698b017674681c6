//! Menu and menu category models

use serde::{Deserialize, Serialize};

use super::lenient;
use super::tree::{TreeItem, TreeNode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    pub id: i64,
    pub name_ar: String,
    pub name_en: String,
    pub is_visible_user: bool,
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategoryInput {
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub id: i64,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default = "default_true")]
    pub is_visible_user: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Navigation entry; `is_home`/`is_footer`/`is_home_footer` pick where it renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: i64,
    pub category_id: i64,
    pub parent_id: Option<i64>,
    pub name_en: String,
    pub name_ar: String,
    pub level_order: i32,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub menu_type: Option<String>,
    pub is_active: bool,
    pub is_home: bool,
    pub is_footer: bool,
    pub is_home_footer: bool,
    pub image: Option<String>,
    pub file: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub child_count: i64,
}

impl TreeItem for Menu {
    fn node_id(&self) -> i64 {
        self.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    fn sort_key(&self) -> (i32, i64) {
        (self.level_order, self.id)
    }
}

pub type MenuTree = TreeNode<Menu>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuInput {
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
    pub level_order: i32,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub url: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::optional_text")]
    pub menu_type: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_home: bool,
    #[serde(default)]
    pub is_footer: bool,
    #[serde(default)]
    pub is_home_footer: bool,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub file: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description_en: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description_ar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_input_type_field() {
        let input: MenuInput = serde_json::from_str(
            r#"{"nameEn":"Contact","nameAr":"اتصل","categoryId":1,"type":"Page","isFooter":true,"levelOrder":""}"#,
        )
        .unwrap();
        assert_eq!(input.menu_type.as_deref(), Some("Page"));
        assert!(input.is_footer);
        assert!(!input.is_home);
        assert_eq!(input.level_order, 0);
    }

    #[test]
    fn test_category_defaults_visible() {
        let input: MenuCategoryInput = serde_json::from_str(r#"{"nameAr":"a","nameEn":"Main"}"#).unwrap();
        assert!(input.is_visible_user);
        assert!(input.is_active);
    }
}
