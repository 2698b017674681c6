//! Identity API endpoints
//!
//! - POST /api/identity/token - Issue a bearer token
//! - POST /api/identity/token/revoke - Logout
//! - /api/identity/user - Users, status and role membership
//! - PUT /api/identity/account/password-and-email - Change own credentials
//! - /api/identity/role - Roles and their permission claims
//!
//! Every payload is wrapped in the `{succeeded, messages, data}` envelope.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::ApiResult;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    Action, ChangeCredentialsInput, PermissionGroup, RegisterInput, RoleInput, TokenRequest,
    UpdatePermissionsInput, UpdateUserInput, UserRolesPayload,
};
use crate::services::IdentityError;

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserQuery {
    pub user_id: String,
}

/// Optional body of the status endpoint; no body flips the current state
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInput {
    #[serde(default, alias = "activateUser")]
    pub is_active: Option<bool>,
}

/// Routes reachable without a token
pub fn public_router() -> Router<AppState> {
    Router::new().route("/token", post(issue_token))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/token/revoke", post(revoke_token))
        .route(
            "/user",
            get(list_users)
                .post(register_user)
                .put(update_user)
                .delete(delete_user),
        )
        .route("/user/{id}", get(get_user))
        .route("/user/{id}/status", put(toggle_status))
        .route("/user/roles/{user_id}", get(get_user_roles).put(update_user_roles))
        .route("/account/password-and-email", put(change_credentials))
        .route("/role", get(list_roles).post(save_role))
        .route("/role/{id}", delete(delete_role))
        .route("/role/permissions/{role_id}", get(get_permissions))
        .route("/role/permissions/updateall", post(update_permissions))
}

/// POST /api/identity/token
///
/// Login failures answer with the envelope rather than `ApiError` so the
/// SPA can show `messages` directly.
async fn issue_token(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> Result<Response, ApiError> {
    match state.users.login(input).await {
        Ok(token) => Ok(Json(ApiResult::success(token)).into_response()),
        Err(err @ (IdentityError::InvalidCredentials | IdentityError::Inactive)) => {
            Ok(ApiResult::failure(StatusCode::UNAUTHORIZED, err.to_string()))
        }
        Err(err @ IdentityError::RateLimited) => {
            Ok(ApiResult::failure(StatusCode::TOO_MANY_REQUESTS, err.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// POST /api/identity/token/revoke
async fn revoke_token(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    state.users.revoke(&auth.token).await?;
    tracing::info!(user_id = %auth.id(), "User logged out");
    Ok(Json(ApiResult::success_with(true, "Logged out")))
}

/// GET /api/identity/user
async fn list_users(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Users, Action::View)?;
    Ok(Json(ApiResult::success(state.users.list().await?)))
}

/// GET /api/identity/user/{id}
async fn get_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Users, Action::View)?;
    Ok(Json(ApiResult::success(state.users.get(&id).await?)))
}

/// POST /api/identity/user
async fn register_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Users, Action::Create)?;
    let id = state.users.register(input).await?;
    Ok(Json(ApiResult::success_with(id, "User Registered")))
}

/// PUT /api/identity/user?id=
async fn update_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<UserIdQuery>,
    Json(input): Json<UpdateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Users, Action::Edit)?;
    let user = state.users.update(auth.id(), &query.id, input).await?;
    Ok(Json(ApiResult::success(user)))
}

/// DELETE /api/identity/user?userId=
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<DeleteUserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Users, Action::Delete)?;
    state.users.delete(auth.id(), &query.user_id).await?;
    Ok(Json(ApiResult::success_with(query.user_id, "User Deleted")))
}

/// PUT /api/identity/user/{id}/status
async fn toggle_status(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    input: Option<Json<StatusInput>>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Users, Action::Edit)?;
    let requested = input.and_then(|Json(body)| body.is_active);
    let active = state.users.set_status(auth.id(), &id, requested).await?;
    let message = if active { "User Activated" } else { "User Deactivated" };
    Ok(Json(ApiResult::success_with(active, message)))
}

/// GET /api/identity/user/roles/{userId}
async fn get_user_roles(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Users, Action::View)?;
    Ok(Json(ApiResult::success(state.users.user_roles(&user_id).await?)))
}

/// PUT /api/identity/user/roles/{userId}
async fn update_user_roles(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(user_id): Path<String>,
    Json(payload): Json<UserRolesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Users, Action::Edit)?;
    state.users.update_user_roles(&user_id, payload).await?;
    Ok(Json(ApiResult::success_with(user_id, "Roles Updated")))
}

/// PUT /api/identity/account/password-and-email
async fn change_credentials(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<ChangeCredentialsInput>,
) -> Result<impl IntoResponse, ApiError> {
    state.users.change_credentials(auth.id(), input).await?;
    Ok(Json(ApiResult::success_with(true, "Credentials Updated")))
}

/// GET /api/identity/role
async fn list_roles(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Roles, Action::View)?;
    Ok(Json(ApiResult::success(state.roles.list().await?)))
}

/// POST /api/identity/role
///
/// An empty id creates, anything else updates.
async fn save_role(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<RoleInput>,
) -> Result<impl IntoResponse, ApiError> {
    let action = match input.id {
        Some(_) => Action::Edit,
        None => Action::Create,
    };
    auth.require(PermissionGroup::Roles, action)?;
    let role = state.roles.upsert(input).await?;
    Ok(Json(ApiResult::success_with(role, "Role Saved")))
}

/// DELETE /api/identity/role/{id}
async fn delete_role(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Roles, Action::Delete)?;
    state.roles.delete(&id).await?;
    Ok(Json(ApiResult::success_with(id, "Role Deleted")))
}

/// GET /api/identity/role/permissions/{roleId}
async fn get_permissions(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(role_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::RoleClaims, Action::View)?;
    Ok(Json(ApiResult::success(state.roles.permissions(&role_id).await?)))
}

/// POST /api/identity/role/permissions/updateall
async fn update_permissions(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<UpdatePermissionsInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::RoleClaims, Action::Edit)?;
    let role_id = input.role_id.clone();
    state.roles.update_permissions(input).await?;
    Ok(Json(ApiResult::success_with(role_id, "Permissions Updated")))
}
