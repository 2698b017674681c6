//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type every handler returns
//! - Authentication (bearer token or `access_token` query)
//! - Authorization (permission claims, Administrator bypass)

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::create_cache;
use crate::config::Config;
use crate::db::repositories::{
    SqlxBlockCategoryRepository, SqlxBlockPhotoRepository, SqlxBlockRepository,
    SqlxBlockVideoRepository, SqlxChatRepository, SqlxCityRepository, SqlxCountryRepository,
    SqlxMenuCategoryRepository, SqlxMenuRepository, SqlxPageAttachmentRepository,
    SqlxPagePhotoRepository, SqlxPageRepository, SqlxRoleRepository, SqlxSessionRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{Action, PermissionGroup, User};
use crate::services::{
    role::grants, BlockCategoryService, BlockPhotoService, BlockService, BlockVideoService,
    ChatError, ChatHub, ChatService, CityService, ContentError, CountryService, IdentityError,
    MenuCategoryService, MenuService, PageAttachmentService, PagePhotoService, PageService,
    RoleService, UploadService, UserAccess, UserService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub roles: Arc<RoleService>,
    pub countries: Arc<CountryService>,
    pub cities: Arc<CityService>,
    pub block_categories: Arc<BlockCategoryService>,
    pub blocks: Arc<BlockService>,
    pub block_photos: Arc<BlockPhotoService>,
    pub block_videos: Arc<BlockVideoService>,
    pub menu_categories: Arc<MenuCategoryService>,
    pub menus: Arc<MenuService>,
    pub pages: Arc<PageService>,
    pub page_photos: Arc<PagePhotoService>,
    pub page_attachments: Arc<PageAttachmentService>,
    pub uploads: Arc<UploadService>,
    pub chat: Arc<ChatService>,
    pub hub: Arc<ChatHub>,
}

impl AppState {
    /// Wire every repository and service onto one pool
    pub fn new(pool: DynDatabasePool, config: &Config) -> Self {
        let cache = create_cache(&config.cache);
        let hub = Arc::new(ChatHub::from_config(&config.chat));
        let uploads = Arc::new(UploadService::new(config.upload.clone()));

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let role_repo = SqlxRoleRepository::boxed(pool.clone());
        let country_repo = SqlxCountryRepository::boxed(pool.clone());
        let block_category_repo = SqlxBlockCategoryRepository::boxed(pool.clone());
        let block_repo = SqlxBlockRepository::boxed(pool.clone());
        let menu_category_repo = SqlxMenuCategoryRepository::boxed(pool.clone());
        let menu_repo = SqlxMenuRepository::boxed(pool.clone());
        let page_repo = SqlxPageRepository::boxed(pool.clone());

        Self {
            users: Arc::new(UserService::new(
                user_repo.clone(),
                SqlxSessionRepository::boxed(pool.clone()),
                role_repo.clone(),
                uploads.clone(),
                hub.clone(),
                &config.auth,
            )),
            roles: Arc::new(RoleService::new(role_repo)),
            countries: Arc::new(CountryService::new(country_repo.clone())),
            cities: Arc::new(CityService::new(SqlxCityRepository::boxed(pool.clone()), country_repo)),
            block_categories: Arc::new(BlockCategoryService::new(
                block_category_repo.clone(),
                cache.clone(),
            )),
            blocks: Arc::new(BlockService::new(block_repo.clone(), block_category_repo)),
            block_photos: Arc::new(BlockPhotoService::new(
                SqlxBlockPhotoRepository::boxed(pool.clone()),
                block_repo.clone(),
            )),
            block_videos: Arc::new(BlockVideoService::new(
                SqlxBlockVideoRepository::boxed(pool.clone()),
                block_repo,
            )),
            menu_categories: Arc::new(MenuCategoryService::new(menu_category_repo.clone(), cache)),
            menus: Arc::new(MenuService::new(menu_repo.clone(), menu_category_repo)),
            pages: Arc::new(PageService::new(page_repo.clone(), menu_repo)),
            page_photos: Arc::new(PagePhotoService::new(
                SqlxPagePhotoRepository::boxed(pool.clone()),
                page_repo.clone(),
            )),
            page_attachments: Arc::new(PageAttachmentService::new(
                SqlxPageAttachmentRepository::boxed(pool.clone()),
                page_repo,
            )),
            uploads,
            chat: Arc::new(ChatService::new(
                SqlxChatRepository::boxed(pool.clone()),
                user_repo,
                hub.clone(),
            )),
            hub,
        }
    }

    /// Create the default roles and the administrator account
    pub async fn seed(&self, config: &Config) -> Result<(), IdentityError> {
        let admin_role = self.roles.ensure_default_roles().await?;
        if self.users.ensure_admin(&config.auth, &admin_role).await? {
            tracing::info!(email = %config.auth.admin_email, "Administrator account created");
        }
        Ok(())
    }
}

/// Authenticated user with the roles and permissions resolved at login time
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub access: UserAccess,
    pub token: String,
}

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    /// Fail with 403 unless the user holds `Permissions.<group>.<action>`
    pub fn require(&self, group: PermissionGroup, action: Action) -> Result<(), ApiError> {
        if self.access.is_admin() || grants(&self.access.permissions, group, action) {
            return Ok(());
        }
        tracing::debug!(
            user_id = %self.user.id,
            group = %group,
            action = action.as_str(),
            "Permission denied"
        );
        Err(ApiError::forbidden(format!(
            "You do not have permission to {} {}",
            action.as_str().to_lowercase(),
            group
        )))
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new("TOO_MANY_REQUESTS", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log the cause and hide it from the client
    fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "Request failed");
        Self::internal_error("An internal error occurred")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "TOO_MANY_REQUESTS" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation(msg) => ApiError::validation_error(msg),
            ContentError::NotFound(msg) => ApiError::not_found(msg),
            ContentError::Conflict(msg) => ApiError::conflict(msg),
            ContentError::Internal(e) => ApiError::internal(e),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials | IdentityError::Inactive => {
                ApiError::unauthorized(err.to_string())
            }
            IdentityError::RateLimited => ApiError::too_many_requests(err.to_string()),
            IdentityError::Unauthorized(msg) => ApiError::unauthorized(msg),
            IdentityError::Forbidden(msg) => ApiError::forbidden(msg),
            IdentityError::Validation(msg) => ApiError::validation_error(msg),
            IdentityError::NotFound(msg) => ApiError::not_found(msg),
            IdentityError::Conflict(msg) => ApiError::conflict(msg),
            IdentityError::Internal(e) => ApiError::internal(e),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(msg) => ApiError::validation_error(msg),
            ChatError::NotFound(msg) => ApiError::not_found(msg),
            ChatError::Unauthorized(msg) => ApiError::unauthorized(msg),
            ChatError::Internal(e) => ApiError::internal(e),
        }
    }
}

/// Extract the session token from the `Authorization` header, falling back
/// to an `access_token` query parameter (browsers cannot set headers on a
/// WebSocket handshake)
pub fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    request.uri().query().and_then(|query| {
        query.split('&').find_map(|pair| {
            pair.strip_prefix("access_token=")
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })
    })
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state.users.validate_session(&token).await?;
    let access = state.users.access_for(&user.id).await?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user, access, token });
    Ok(next.run(request).await)
}
