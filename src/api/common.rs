//! Common API utilities and shared types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// `{succeeded, messages, data}` wrapper used by the identity, countries
/// and cities endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResult<T> {
    pub succeeded: bool,
    pub messages: Vec<String>,
    pub data: Option<T>,
}

impl<T> ApiResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            succeeded: true,
            messages: Vec::new(),
            data: Some(data),
        }
    }

    pub fn success_with(data: T, message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            messages: vec![message.into()],
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            messages: vec![message.into()],
            data: None,
        }
    }
}

impl ApiResult<()> {
    /// A `succeeded: false` envelope with a status other than 200
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
        (status, Json(ApiResult::<()>::fail(message))).into_response()
    }
}

/// `{items}` list wrapper for the block, menu and page listings
#[derive(Debug, Serialize, Deserialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for Items<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// `?id=` query used by the photo, video and attachment lookups
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i64,
}
