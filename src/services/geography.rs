//! Countries and cities reference data

use crate::db::repositories::{CityRepository, CountryRepository};
use crate::models::{City, CityInput, Country, CountryInput};
use crate::services::error::ContentError;
use std::sync::Arc;

pub struct CountryService {
    country_repo: Arc<dyn CountryRepository>,
}

impl CountryService {
    pub fn new(country_repo: Arc<dyn CountryRepository>) -> Self {
        Self { country_repo }
    }

    /// Live countries ordered by English name
    pub async fn list(&self) -> Result<Vec<Country>, ContentError> {
        Ok(self.country_repo.list().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Country, ContentError> {
        self.country_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::record_not_found(id))
    }

    /// Create when `id == 0`, otherwise update; returns the row id
    pub async fn upsert(&self, input: CountryInput) -> Result<i64, ContentError> {
        let country = input.into_country();
        validate_names(&country.name_ar, &country.name_en)?;
        check_code(country.alpha2_code.as_deref(), 2, "Alpha-2 code")?;
        check_code(country.alpha3_code.as_deref(), 3, "Alpha-3 code")?;

        if country.id == 0 {
            let id = self.country_repo.create(&country).await?;
            tracing::info!(country_id = id, name = %country.name_en, "Country created");
            return Ok(id);
        }

        if !self.country_repo.update(&country).await? {
            return Err(ContentError::record_not_found(country.id));
        }
        Ok(country.id)
    }

    /// Soft delete, refused while live cities point at the country
    pub async fn delete(&self, id: i64) -> Result<i64, ContentError> {
        self.get(id).await?;
        let cities = self.country_repo.city_count(id).await?;
        if cities > 0 {
            return Err(ContentError::Validation(format!(
                "Country is used by {} cities and cannot be deleted",
                cities
            )));
        }
        self.country_repo.soft_delete(id).await?;
        Ok(id)
    }
}

pub struct CityService {
    city_repo: Arc<dyn CityRepository>,
    country_repo: Arc<dyn CountryRepository>,
}

impl CityService {
    pub fn new(city_repo: Arc<dyn CityRepository>, country_repo: Arc<dyn CountryRepository>) -> Self {
        Self {
            city_repo,
            country_repo,
        }
    }

    pub async fn list(&self) -> Result<Vec<City>, ContentError> {
        Ok(self.city_repo.list().await?)
    }

    pub async fn list_by_country(&self, country_id: i64) -> Result<Vec<City>, ContentError> {
        Ok(self.city_repo.list_by_country(country_id).await?)
    }

    pub async fn get(&self, id: i64) -> Result<City, ContentError> {
        self.city_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::record_not_found(id))
    }

    pub async fn upsert(&self, input: CityInput) -> Result<i64, ContentError> {
        let city = City {
            id: input.id,
            name_ar: input.name_ar.trim().to_string(),
            name_en: input.name_en.trim().to_string(),
            country_id: input.country_id,
            is_active: input.is_active,
            country_name_en: None,
            country_name_ar: None,
        };
        validate_names(&city.name_ar, &city.name_en)?;
        if self.country_repo.get_by_id(city.country_id).await?.is_none() {
            return Err(ContentError::Validation(format!(
                "Country with Id = {} does not exist",
                city.country_id
            )));
        }

        if city.id == 0 {
            let id = self.city_repo.create(&city).await?;
            tracing::info!(city_id = id, country_id = city.country_id, "City created");
            return Ok(id);
        }

        if !self.city_repo.update(&city).await? {
            return Err(ContentError::record_not_found(city.id));
        }
        Ok(city.id)
    }

    pub async fn delete(&self, id: i64) -> Result<i64, ContentError> {
        if !self.city_repo.soft_delete(id).await? {
            return Err(ContentError::record_not_found(id));
        }
        Ok(id)
    }
}

fn validate_names(name_ar: &str, name_en: &str) -> Result<(), ContentError> {
    if name_ar.is_empty() {
        return Err(ContentError::validation("Arabic name is required"));
    }
    if name_en.is_empty() {
        return Err(ContentError::validation("English name is required"));
    }
    Ok(())
}

fn check_code(code: Option<&str>, len: usize, label: &str) -> Result<(), ContentError> {
    match code {
        Some(code) if code.len() != len || !code.chars().all(|c| c.is_ascii_alphabetic()) => Err(
            ContentError::Validation(format!("{} must be {} letters", label, len)),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::{SqlxCityRepository, SqlxCountryRepository};

    async fn setup() -> (CountryService, CityService) {
        let pool = migrated_pool().await;
        let countries = SqlxCountryRepository::boxed(pool.clone());
        (
            CountryService::new(countries.clone()),
            CityService::new(SqlxCityRepository::boxed(pool), countries),
        )
    }

    fn country(json: serde_json::Value) -> CountryInput {
        serde_json::from_value(json).unwrap()
    }

    fn city(json: serde_json::Value) -> CityInput {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn test_country_create_get_update_delete() {
        let (countries, _) = setup().await;
        let id = countries
            .upsert(country(serde_json::json!({
                "id": 0, "nameAr": "الأردن", "nameEn": "Jordan", "alpha2Code": "jo", "alpha3Code": "jor"
            })))
            .await
            .unwrap();

        let fetched = countries.get(id).await.unwrap();
        assert_eq!(fetched.name_en, "Jordan");
        assert_eq!(fetched.alpha2_code.as_deref(), Some("JO"));

        countries
            .upsert(country(serde_json::json!({
                "id": id, "nameAr": "الأردن", "nameEn": "Hashemite Kingdom of Jordan"
            })))
            .await
            .unwrap();
        assert_eq!(countries.get(id).await.unwrap().name_en, "Hashemite Kingdom of Jordan");

        assert_eq!(countries.delete(id).await.unwrap(), id);
        assert!(matches!(countries.get(id).await, Err(ContentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_country_validation() {
        let (countries, _) = setup().await;
        for bad in [
            serde_json::json!({"nameAr": "", "nameEn": "X"}),
            serde_json::json!({"nameAr": "س", "nameEn": "X", "alpha2Code": "ABC"}),
            serde_json::json!({"nameAr": "س", "nameEn": "X", "alpha3Code": "A1C"}),
        ] {
            assert!(matches!(countries.upsert(country(bad)).await, Err(ContentError::Validation(_))));
        }
        assert!(matches!(
            countries
                .upsert(country(serde_json::json!({"id": 999, "nameAr": "س", "nameEn": "X"})))
                .await,
            Err(ContentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cities_need_a_country() {
        let (countries, cities) = setup().await;
        assert!(matches!(
            cities
                .upsert(city(serde_json::json!({"nameAr": "عمان", "nameEn": "Amman", "countryId": 42})))
                .await,
            Err(ContentError::Validation(_))
        ));

        let jordan = countries
            .upsert(country(serde_json::json!({"nameAr": "الأردن", "nameEn": "Jordan"})))
            .await
            .unwrap();
        let amman = cities
            .upsert(city(serde_json::json!({"nameAr": "عمان", "nameEn": "Amman", "countryId": jordan})))
            .await
            .unwrap();

        let fetched = cities.get(amman).await.unwrap();
        assert_eq!(fetched.country_name_en.as_deref(), Some("Jordan"));
        assert_eq!(cities.list_by_country(jordan).await.unwrap().len(), 1);

        // the country stays while the city lives
        assert!(matches!(countries.delete(jordan).await, Err(ContentError::Validation(_))));
        cities.delete(amman).await.unwrap();
        assert!(matches!(cities.delete(amman).await, Err(ContentError::NotFound(_))));
        countries.delete(jordan).await.unwrap();
    }
}
