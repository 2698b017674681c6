//! Pages API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::api::common::Items;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Action, PageInput, PageListQuery, PermissionGroup};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pages).post(create_page))
        .route("/{id}", get(get_page).put(update_page).delete(delete_page))
}

/// GET /api/Pages?menuId=
async fn list_pages(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<PageListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Pages, Action::View)?;
    Ok(Json(Items::from(state.pages.list(query.menu_id).await?)))
}

async fn get_page(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Pages, Action::View)?;
    Ok(Json(state.pages.get(id).await?))
}

async fn create_page(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<PageInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Pages, Action::Create)?;
    let page = state.pages.create(input).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_page(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<PageInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Pages, Action::Edit)?;
    Ok(Json(state.pages.update(id, input).await?))
}

async fn delete_page(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Pages, Action::Delete)?;
    state.pages.delete(id).await?;
    Ok(StatusCode::OK)
}
