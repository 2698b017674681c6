//! Block API endpoints
//!
//! - /api/BlockCategories - Category CRUD (list is cached)
//! - /api/Blocks - GetMaster, NoCategory, Tree and block CRUD
//!
//! These endpoints return bare JSON; lists come as `{items}`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::Items;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{lenient, Action, BlockCategoryInput, BlockInput, PermissionGroup};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterQuery {
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub block_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeQuery {
    pub category_id: i64,
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

pub fn blocks_router() -> Router<AppState> {
    Router::new()
        .route("/GetMaster", get(get_master))
        .route("/NoCategory", get(list_all_blocks))
        .route("/Tree", get(block_tree))
        .route("/", post(create_block))
        .route("/{id}", get(get_block).put(update_block).delete(delete_block))
}

/// GET /api/BlockCategories/all
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockCategories, Action::View)?;
    Ok(Json(state.block_categories.list().await?))
}

async fn get_category(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockCategories, Action::View)?;
    Ok(Json(state.block_categories.get(id).await?))
}

async fn create_category(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<BlockCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockCategories, Action::Create)?;
    let category = state.block_categories.create(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<BlockCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockCategories, Action::Edit)?;
    Ok(Json(state.block_categories.update(id, input).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockCategories, Action::Delete)?;
    state.block_categories.delete(id).await?;
    Ok(StatusCode::OK)
}

/// GET /api/Blocks/GetMaster?categoryId=&blockId=
async fn get_master(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<MasterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Blocks, Action::View)?;
    let blocks = state.blocks.get_master(query.category_id, query.block_id).await?;
    Ok(Json(Items::from(blocks)))
}

/// GET /api/Blocks/NoCategory
async fn list_all_blocks(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Blocks, Action::View)?;
    Ok(Json(Items::from(state.blocks.list_all().await?)))
}

/// GET /api/Blocks/Tree?categoryId=
async fn block_tree(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<TreeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Blocks, Action::View)?;
    Ok(Json(state.blocks.tree(query.category_id).await?))
}

async fn get_block(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Blocks, Action::View)?;
    Ok(Json(state.blocks.get(id).await?))
}

async fn create_block(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<BlockInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Blocks, Action::Create)?;
    let block = state.blocks.create(input).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

async fn update_block(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<BlockInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Blocks, Action::Edit)?;
    Ok(Json(state.blocks.update(id, input).await?))
}

async fn delete_block(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Blocks, Action::Delete)?;
    state.blocks.delete(id).await?;
    Ok(StatusCode::OK)
}
