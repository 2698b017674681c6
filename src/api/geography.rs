//! Country and city API endpoints
//!
//! - /api/v1/Countries - GetAll, get, upsert, delete
//! - /api/v1/Cities - GetAll, GetByCountry, get, upsert, delete

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::common::ApiResult;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Action, CityInput, CountryInput, PermissionGroup};

fn upsert_action(id: i64) -> Action {
    if id == 0 {
        Action::Create
    } else {
        Action::Edit
    }
}

pub fn countries_router() -> Router<AppState> {
    Router::new()
        .route("/GetAll", get(list_countries))
        .route("/", post(save_country))
        .route("/{id}", get(get_country).delete(delete_country))
}

pub fn cities_router() -> Router<AppState> {
    Router::new()
        .route("/GetAll", get(list_cities))
        .route("/GetByCountry/{country_id}", get(list_cities_by_country))
        .route("/", post(save_city))
        .route("/{id}", get(get_city).delete(delete_city))
}

async fn list_countries(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Countries, Action::View)?;
    Ok(Json(ApiResult::success(state.countries.list().await?)))
}

async fn get_country(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Countries, Action::View)?;
    Ok(Json(ApiResult::success(state.countries.get(id).await?)))
}

async fn save_country(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<CountryInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Countries, upsert_action(input.id))?;
    let id = state.countries.upsert(input).await?;
    Ok(Json(ApiResult::success_with(id, "Country Saved")))
}

async fn delete_country(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Countries, Action::Delete)?;
    let id = state.countries.delete(id).await?;
    Ok(Json(ApiResult::success_with(id, "Country Deleted")))
}

async fn list_cities(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Cities, Action::View)?;
    Ok(Json(ApiResult::success(state.cities.list().await?)))
}

async fn list_cities_by_country(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(country_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Cities, Action::View)?;
    Ok(Json(ApiResult::success(state.cities.list_by_country(country_id).await?)))
}

async fn get_city(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Cities, Action::View)?;
    Ok(Json(ApiResult::success(state.cities.get(id).await?)))
}

async fn save_city(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<CityInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Cities, upsert_action(input.id))?;
    let id = state.cities.upsert(input).await?;
    Ok(Json(ApiResult::success_with(id, "City Saved")))
}

async fn delete_city(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Cities, Action::Delete)?;
    let id = state.cities.delete(id).await?;
    Ok(Json(ApiResult::success_with(id, "City Deleted")))
}
