//! Country and city reference data

use serde::{Deserialize, Serialize};

use super::lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: i64,
    pub name_ar: String,
    pub name_en: String,
    pub alpha2_code: Option<String>,
    pub alpha3_code: Option<String>,
    pub phone_code: Option<String>,
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Upsert payload: `id == 0` creates
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryInput {
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub id: i64,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub alpha2_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub alpha3_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub phone_code: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CountryInput {
    pub fn into_country(self) -> Country {
        Country {
            id: self.id,
            name_ar: self.name_ar.trim().to_string(),
            name_en: self.name_en.trim().to_string(),
            alpha2_code: self.alpha2_code.map(|c| c.trim().to_uppercase()),
            alpha3_code: self.alpha3_code.map(|c| c.trim().to_uppercase()),
            phone_code: self.phone_code.map(|c| c.trim().to_string()),
            is_active: self.is_active,
        }
    }
}

/// City with the owning country's names joined in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: i64,
    pub name_ar: String,
    pub name_en: String,
    pub country_id: i64,
    pub is_active: bool,
    pub country_name_en: Option<String>,
    pub country_name_ar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityInput {
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub id: i64,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub country_id: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}
