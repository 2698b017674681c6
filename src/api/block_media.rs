//! Block photo and video endpoints
//!
//! - /api/BlockPhoto - GetPhotoByBlockId, create, delete
//! - /api/BlockVideo - get, GetVideoByBlockId, create, update, delete

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use crate::api::common::IdQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Action, BlockPhotoInput, BlockVideoInput, PermissionGroup};

pub fn photos_router() -> Router<AppState> {
    Router::new()
        .route("/GetPhotoByBlockId", get(list_photos))
        .route("/", post(create_photo))
        .route("/{id}", delete(delete_photo))
}

pub fn videos_router() -> Router<AppState> {
    Router::new()
        .route("/GetVideoByBlockId", get(list_videos))
        .route("/", post(create_video))
        .route("/{id}", get(get_video).put(update_video).delete(delete_video))
}

/// GET /api/BlockPhoto/GetPhotoByBlockId?id=
async fn list_photos(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockPhotos, Action::View)?;
    Ok(Json(state.block_photos.list_by_block(query.id).await?))
}

async fn create_photo(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<BlockPhotoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockPhotos, Action::Create)?;
    let photo = state.block_photos.create(input).await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

async fn delete_photo(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockPhotos, Action::Delete)?;
    state.block_photos.delete(id).await?;
    Ok(StatusCode::OK)
}

/// GET /api/BlockVideo/GetVideoByBlockId?id=
async fn list_videos(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockVideos, Action::View)?;
    Ok(Json(state.block_videos.list_by_block(query.id).await?))
}

async fn get_video(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockVideos, Action::View)?;
    Ok(Json(state.block_videos.get(id).await?))
}

async fn create_video(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<BlockVideoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockVideos, Action::Create)?;
    let video = state.block_videos.create(input).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

async fn update_video(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<BlockVideoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockVideos, Action::Edit)?;
    Ok(Json(state.block_videos.update(id, input).await?))
}

async fn delete_video(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::BlockVideos, Action::Delete)?;
    state.block_videos.delete(id).await?;
    Ok(StatusCode::OK)
}
