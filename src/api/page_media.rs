//! Page photo and attachment endpoints
//!
//! - /api/PagePhoto - GetPhotoByPageId, create, delete
//! - /api/PageAttachement - GetAttachementByPageId, create, delete

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use crate::api::common::IdQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Action, PageAttachmentInput, PagePhotoInput, PermissionGroup};

pub fn photos_router() -> Router<AppState> {
    Router::new()
        .route("/GetPhotoByPageId", get(list_photos))
        .route("/", post(create_photo))
        .route("/{id}", delete(delete_photo))
}

pub fn attachments_router() -> Router<AppState> {
    Router::new()
        .route("/GetAttachementByPageId", get(list_attachments))
        .route("/", post(create_attachment))
        .route("/{id}", delete(delete_attachment))
}

async fn list_photos(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::PagePhotos, Action::View)?;
    Ok(Json(state.page_photos.list_by_page(query.id).await?))
}

async fn create_photo(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<PagePhotoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::PagePhotos, Action::Create)?;
    let photo = state.page_photos.create(input).await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

async fn delete_photo(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::PagePhotos, Action::Delete)?;
    state.page_photos.delete(id).await?;
    Ok(StatusCode::OK)
}

async fn list_attachments(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::PageAttachments, Action::View)?;
    Ok(Json(state.page_attachments.list_by_page(query.id).await?))
}

async fn create_attachment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<PageAttachmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::PageAttachments, Action::Create)?;
    let attachment = state.page_attachments.create(input).await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

async fn delete_attachment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::PageAttachments, Action::Delete)?;
    state.page_attachments.delete(id).await?;
    Ok(StatusCode::OK)
}
