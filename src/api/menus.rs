//! Menu API endpoints
//!
//! - /api/v1/MenuCategories - Category CRUD (list is cached)
//! - /api/v1/Menus - GetMaster, NoCategory, Tree, Home, Footer and menu CRUD

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::blocks::TreeQuery;
use crate::api::common::Items;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::db::repositories::MenuLocation;
use crate::models::{lenient, Action, MenuCategoryInput, MenuInput, PermissionGroup};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterQuery {
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub menu_id: Option<i64>,
}

pub fn categories_router() -> Router<AppState> {
    Router::new()
        .route("/all", get(list_categories))
        .route("/", post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

pub fn menus_router() -> Router<AppState> {
    Router::new()
        .route("/GetMaster", get(get_master))
        .route("/NoCategory", get(list_all_menus))
        .route("/Tree", get(menu_tree))
        .route("/Home", get(home_menus))
        .route("/Footer", get(footer_menus))
        .route("/", post(create_menu))
        .route("/{id}", get(get_menu).put(update_menu).delete(delete_menu))
}

async fn list_categories(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::MenuCategories, Action::View)?;
    Ok(Json(state.menu_categories.list().await?))
}

async fn get_category(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::MenuCategories, Action::View)?;
    Ok(Json(state.menu_categories.get(id).await?))
}

async fn create_category(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<MenuCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::MenuCategories, Action::Create)?;
    let category = state.menu_categories.create(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<MenuCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::MenuCategories, Action::Edit)?;
    Ok(Json(state.menu_categories.update(id, input).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::MenuCategories, Action::Delete)?;
    state.menu_categories.delete(id).await?;
    Ok(StatusCode::OK)
}

/// GET /api/v1/Menus/GetMaster?categoryId=&menuId=
async fn get_master(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<MasterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Menus, Action::View)?;
    let menus = state.menus.get_master(query.category_id, query.menu_id).await?;
    Ok(Json(Items::from(menus)))
}

async fn list_all_menus(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Menus, Action::View)?;
    Ok(Json(Items::from(state.menus.list_all().await?)))
}

async fn menu_tree(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<TreeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Menus, Action::View)?;
    Ok(Json(state.menus.tree(query.category_id).await?))
}

async fn home_menus(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Menus, Action::View)?;
    Ok(Json(state.menus.for_location(MenuLocation::Home).await?))
}

async fn footer_menus(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Menus, Action::View)?;
    Ok(Json(state.menus.for_location(MenuLocation::Footer).await?))
}

async fn get_menu(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Menus, Action::View)?;
    Ok(Json(state.menus.get(id).await?))
}

async fn create_menu(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<MenuInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Menus, Action::Create)?;
    let menu = state.menus.create(input).await?;
    Ok((StatusCode::CREATED, Json(menu)))
}

async fn update_menu(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<MenuInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Menus, Action::Edit)?;
    Ok(Json(state.menus.update(id, input).await?))
}

async fn delete_menu(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Menus, Action::Delete)?;
    state.menus.delete(id).await?;
    Ok(StatusCode::OK)
}
