//! API layer - HTTP handlers and routing
//!
//! - Identity: tokens, users, roles and permission claims
//! - Countries and cities reference data
//! - Block categories, blocks, block photos and videos
//! - Menu categories and menus
//! - Pages, page photos and attachments
//! - File uploads and static serving of uploaded files
//! - Chat REST endpoints and the chat WebSocket

pub mod block_media;
pub mod blocks;
pub mod chats;
pub mod common;
pub mod geography;
pub mod hub;
pub mod identity;
pub mod menus;
pub mod middleware;
pub mod page_media;
pub mod pages;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::services::upload::PUBLIC_PREFIX;

pub use common::{ApiResult, Items};
pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build every API route; all but token issue sit behind `require_auth`
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let upload_limit = usize::try_from(state.uploads.max_file_size())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let protected = Router::new()
        .nest("/api/identity", identity::protected_router())
        .nest("/api/v1/Countries", geography::countries_router())
        .nest("/api/v1/Cities", geography::cities_router())
        .nest("/api/BlockCategories", blocks::categories_router())
        .nest("/api/Blocks", blocks::blocks_router())
        .nest("/api/BlockPhoto", block_media::photos_router())
        .nest("/api/BlockVideo", block_media::videos_router())
        .nest("/api/v1/MenuCategories", menus::categories_router())
        .nest("/api/v1/Menus", menus::menus_router())
        .nest("/api/Pages", pages::router())
        .nest("/api/PagePhoto", page_media::photos_router())
        .nest("/api/PageAttachement", page_media::attachments_router())
        .nest(
            "/api/FileUpload",
            upload::router().layer(DefaultBodyLimit::max(upload_limit)),
        )
        .nest("/api/Chats", chats::router())
        .merge(hub::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .nest("/api/identity", identity::public_router())
        .merge(protected)
}

fn cors_layer(cors_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if cors_origin.trim() == "*" {
        return cors.allow_origin(Any);
    }
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(origin = %cors_origin, error = %e, "Invalid CORS origin; cross-origin requests disabled");
            cors
        }
    }
}

/// Build the complete application router
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // uploaded files are never rendered as active content on this origin
    let uploads = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("sandbox"),
        ))
        .service(ServeDir::new(state.uploads.root()));

    Router::new()
        .merge(build_api_router(state.clone()))
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(cors_layer(cors_origin))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
