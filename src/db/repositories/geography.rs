//! Country and city repositories

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::{City, Country};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait CountryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Country>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Country>>;
    async fn create(&self, country: &Country) -> Result<i64>;
    async fn update(&self, country: &Country) -> Result<bool>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
    /// Live cities still pointing at the country
    async fn city_count(&self, id: i64) -> Result<i64>;
}

#[async_trait]
pub trait CityRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<City>>;
    async fn list_by_country(&self, country_id: i64) -> Result<Vec<City>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<City>>;
    async fn create(&self, city: &City) -> Result<i64>;
    async fn update(&self, city: &City) -> Result<bool>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

const COUNTRY_SELECT: &str = "SELECT id, name_ar, name_en, alpha2_code, alpha3_code, phone_code, is_active \
     FROM countries WHERE is_deleted = 0";

const CITY_SELECT: &str = "SELECT ci.id, ci.name_ar, ci.name_en, ci.country_id, ci.is_active, \
     co.name_en AS country_name_en, co.name_ar AS country_name_ar \
     FROM cities ci LEFT JOIN countries co ON co.id = ci.country_id \
     WHERE ci.is_deleted = 0";

pub struct SqlxCountryRepository {
    pool: DynDatabasePool,
}

impl SqlxCountryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CountryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CountryRepository for SqlxCountryRepository {
    async fn list(&self) -> Result<Vec<Country>> {
        let sql = format!("{} ORDER BY name_en", COUNTRY_SELECT);
        let countries = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Country>(&sql)
                .fetch_all(p)
                .await
                .context("Failed to list countries")?
        });
        Ok(countries)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Country>> {
        let sql = format!("{} AND id = ?", COUNTRY_SELECT);
        let country = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Country>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get country")?
        });
        Ok(country)
    }

    async fn create(&self, country: &Country) -> Result<i64> {
        let sql = "INSERT INTO countries (name_ar, name_en, alpha2_code, alpha3_code, phone_code, is_active) \
                   VALUES (?, ?, ?, ?, ?, ?)";
        let id = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(&country.name_ar)
                .bind(&country.name_en)
                .bind(&country.alpha2_code)
                .bind(&country.alpha3_code)
                .bind(&country.phone_code)
                .bind(country.is_active)
                .execute(p)
                .await
                .context("Failed to create country")?
                .last_id()
        });
        Ok(id)
    }

    async fn update(&self, country: &Country) -> Result<bool> {
        let sql = "UPDATE countries SET name_ar = ?, name_en = ?, alpha2_code = ?, alpha3_code = ?, \
                   phone_code = ?, is_active = ? WHERE id = ? AND is_deleted = 0";
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(&country.name_ar)
                .bind(&country.name_en)
                .bind(&country.alpha2_code)
                .bind(&country.alpha3_code)
                .bind(&country.phone_code)
                .bind(country.is_active)
                .bind(country.id)
                .execute(p)
                .await
                .context("Failed to update country")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE countries SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete country")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn city_count(&self, id: i64) -> Result<i64> {
        let count: i64 = with_pool!(self.pool, |p| {
            sqlx::query_scalar("SELECT COUNT(*) FROM cities WHERE country_id = ? AND is_deleted = 0")
                .bind(id)
                .fetch_one(p)
                .await
                .context("Failed to count cities")?
        });
        Ok(count)
    }
}

pub struct SqlxCityRepository {
    pool: DynDatabasePool,
}

impl SqlxCityRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CityRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CityRepository for SqlxCityRepository {
    async fn list(&self) -> Result<Vec<City>> {
        let sql = format!("{} ORDER BY ci.name_en", CITY_SELECT);
        let cities = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, City>(&sql)
                .fetch_all(p)
                .await
                .context("Failed to list cities")?
        });
        Ok(cities)
    }

    async fn list_by_country(&self, country_id: i64) -> Result<Vec<City>> {
        let sql = format!("{} AND ci.country_id = ? ORDER BY ci.name_en", CITY_SELECT);
        let cities = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, City>(&sql)
                .bind(country_id)
                .fetch_all(p)
                .await
                .context("Failed to list cities by country")?
        });
        Ok(cities)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<City>> {
        let sql = format!("{} AND ci.id = ?", CITY_SELECT);
        let city = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, City>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get city")?
        });
        Ok(city)
    }

    async fn create(&self, city: &City) -> Result<i64> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO cities (name_ar, name_en, country_id, is_active) VALUES (?, ?, ?, ?)")
                .bind(&city.name_ar)
                .bind(&city.name_en)
                .bind(city.country_id)
                .bind(city.is_active)
                .execute(p)
                .await
                .context("Failed to create city")?
                .last_id()
        });
        Ok(id)
    }

    async fn update(&self, city: &City) -> Result<bool> {
        let sql = "UPDATE cities SET name_ar = ?, name_en = ?, country_id = ?, is_active = ? \
                   WHERE id = ? AND is_deleted = 0";
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(&city.name_ar)
                .bind(&city.name_en)
                .bind(city.country_id)
                .bind(city.is_active)
                .bind(city.id)
                .execute(p)
                .await
                .context("Failed to update city")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE cities SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete city")?
                .rows_affected()
        });
        Ok(affected > 0)
    }
}
