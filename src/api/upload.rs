//! Upload API endpoint
//!
//! POST /api/FileUpload/{location}/{uploadType} with a multipart field named
//! "file". Responds with the stored file name as a JSON string; the file is
//! then served under `/Files/UploadFiles/<Dir>/<name>`.

use axum::{
    extract::{Multipart, Path, State},
    routing::post,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::{UploadKind, UploadLocation};

pub fn router() -> Router<AppState> {
    Router::new().route("/{location}/{upload_type}", post(upload_file))
}

/// Map the numeric path segments onto storage location and upload kind
fn parse_target(location: i64, upload_type: i64) -> Result<(UploadLocation, UploadKind), ApiError> {
    let location = UploadLocation::from_code(location)
        .ok_or_else(|| ApiError::validation_error(format!("Unknown upload location: {}", location)))?;
    let kind = UploadKind::from_code(upload_type)
        .ok_or_else(|| ApiError::validation_error(format!("Unknown upload type: {}", upload_type)))?;
    Ok((location, kind))
}

async fn upload_file(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path((location, upload_type)): Path<(i64, i64)>,
    mut multipart: Multipart,
) -> Result<Json<String>, ApiError> {
    let (location, kind) = parse_target(location, upload_type)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("unknown").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        let stored = state
            .uploads
            .store(location, kind, &file_name, &content_type, &data)
            .await?;
        tracing::debug!(user_id = %auth.id(), url = %stored.public_url(), "Upload stored");
        return Ok(Json(stored.file_name));
    }

    Err(ApiError::validation_error("No file provided"))
}
