//! Upload service
//!
//! Stores uploaded files under `<upload.path>/<Dir>/<uuid>.<ext>`, one
//! directory per location:
//!
//! | code | directory         |
//! |------|-------------------|
//! | 1    | `BlocksFiles`     |
//! | 2    | `MenusFiles`      |
//! | 3    | `PagesFiles`      |
//! | 4    | `ProfilePictures` |
//!
//! Files are served back at `/Files/UploadFiles/<Dir>/<name>`.

use anyhow::Context;
use data_encoding::{BASE64, BASE64_NOPAD};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::models::UploadRequest;
use crate::services::error::ContentError;

/// URL prefix the upload root is mounted at
pub const PUBLIC_PREFIX: &str = "/Files/UploadFiles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadLocation {
    BlocksFiles,
    MenusFiles,
    PagesFiles,
    ProfilePictures,
}

impl UploadLocation {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(UploadLocation::BlocksFiles),
            2 => Some(UploadLocation::MenusFiles),
            3 => Some(UploadLocation::PagesFiles),
            4 => Some(UploadLocation::ProfilePictures),
            _ => None,
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            UploadLocation::BlocksFiles => "BlocksFiles",
            UploadLocation::MenusFiles => "MenusFiles",
            UploadLocation::PagesFiles => "PagesFiles",
            UploadLocation::ProfilePictures => "ProfilePictures",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Document,
}

impl UploadKind {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(UploadKind::Image),
            2 => Some(UploadKind::Document),
            _ => None,
        }
    }
}

/// A file written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub location: UploadLocation,
    pub size: u64,
}

impl StoredFile {
    pub fn public_url(&self) -> String {
        format!("{}/{}/{}", PUBLIC_PREFIX, self.location.dir_name(), self.file_name)
    }
}

pub struct UploadService {
    config: UploadConfig,
}

impl UploadService {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.path
    }

    pub fn max_file_size(&self) -> u64 {
        self.config.max_file_size
    }

    /// Validate and store one uploaded file.
    ///
    /// The stored extension always comes from the accepted MIME type, never
    /// from the client's file name; types without a known extension are
    /// stored as `.bin`.
    pub async fn store(
        &self,
        location: UploadLocation,
        kind: UploadKind,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredFile, ContentError> {
        if data.is_empty() {
            return Err(ContentError::validation("No file provided"));
        }
        if data.len() as u64 > self.config.max_file_size {
            return Err(ContentError::Validation(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                self.config.max_file_size,
                self.config.max_file_size / 1024 / 1024
            )));
        }

        let extension = match kind {
            UploadKind::Image => {
                if !self.config.is_image_allowed(content_type) {
                    return Err(ContentError::Validation(format!(
                        "Invalid file type: {}. Allowed types: {:?}",
                        content_type, self.config.allowed_image_types
                    )));
                }
                UploadConfig::image_extension(content_type)
            }
            UploadKind::Document => {
                if !self.config.is_document_allowed(content_type) {
                    return Err(ContentError::Validation(format!(
                        "Invalid file type: {}. Allowed types: {:?}",
                        content_type, self.config.allowed_document_types
                    )));
                }
                UploadConfig::document_extension(content_type)
            }
        }
        .unwrap_or("bin");

        if let Some(claimed) = sanitize_extension(original_name) {
            if claimed != extension {
                tracing::debug!(claimed = %claimed, stored = extension, "Upload extension replaced");
            }
        }

        let dir = self.config.path.join(location.dir_name());
        ensure_dir(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        fs::write(dir.join(&file_name), data)
            .await
            .with_context(|| format!("Failed to save file {}", file_name))?;

        tracing::info!(
            location = location.dir_name(),
            file = %file_name,
            size = data.len(),
            "File uploaded"
        );

        Ok(StoredFile {
            file_name,
            location,
            size: data.len() as u64,
        })
    }

    /// Store a base64 file carried inside a JSON body
    pub async fn store_inline(
        &self,
        location: UploadLocation,
        request: &UploadRequest,
    ) -> Result<StoredFile, ContentError> {
        // uploadType 0 is what the SPA sends when it leaves the field unset
        let kind = match request.upload_type {
            0 => UploadKind::Image,
            code => UploadKind::from_code(code)
                .ok_or_else(|| ContentError::Validation(format!("Unknown upload type: {}", code)))?,
        };

        let (declared_type, payload) = split_data_url(&request.data);
        let data = decode_base64(payload)
            .ok_or_else(|| ContentError::validation("Upload data is not valid base64"))?;

        let extension = sanitize_extension(&request.extension)
            .or_else(|| sanitize_extension(&request.file_name))
            .unwrap_or_default();
        let content_type = declared_type
            .map(str::to_string)
            .or_else(|| mime_for_extension(&extension).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let original_name = if request.file_name.contains('.') || extension.is_empty() {
            request.file_name.clone()
        } else {
            format!("{}.{}", request.file_name, extension)
        };

        self.store(location, kind, &original_name, &content_type, &data).await
    }
}

async fn ensure_dir(path: &PathBuf) -> Result<(), ContentError> {
    if !path.exists() {
        fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create upload dir {}", path.display()))?;
    }
    Ok(())
}

/// Lower-cased extension of a file name, or of a bare extension like `.png`.
///
/// Only short ASCII alphanumeric extensions survive; anything else could
/// smuggle path separators into the stored name.
pub fn sanitize_extension(name: &str) -> Option<String> {
    let ext = name.rsplit('.').next()?.trim();
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Split `data:<mime>;base64,<payload>` into its MIME type and payload
fn split_data_url(data: &str) -> (Option<&str>, &str) {
    let data = data.trim();
    match data.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((header, payload)) => {
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            (mime, payload)
        }
        None => (None, data),
    }
}

fn decode_base64(payload: &str) -> Option<Vec<u8>> {
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(cleaned.as_bytes())
        .or_else(|_| BASE64_NOPAD.decode(cleaned.trim_end_matches('=').as_bytes()))
        .ok()
}

fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        "ico" => Some("image/x-icon"),
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "xls" => Some("application/vnd.ms-excel"),
        "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        "ppt" => Some("application/vnd.ms-powerpoint"),
        "pptx" => Some("application/vnd.openxmlformats-officedocument.presentationml.presentation"),
        "zip" => Some("application/zip"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}
