//! Error type shared by the reference-data and content services

/// Outcome of a failed countries/cities, block, menu, page or upload operation
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Input failed a business rule
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Uniqueness or "still in use" conflict
    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ContentError {
    /// The SPA's wording for a missing row
    pub fn record_not_found(id: i64) -> Self {
        ContentError::NotFound(format!("Record with Id = {} not found", id))
    }

    pub fn ids_not_matching() -> Self {
        ContentError::NotFound("IDs are not matching".to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ContentError::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ContentError::record_not_found(7).to_string(), "Record with Id = 7 not found");
        assert_eq!(ContentError::ids_not_matching().to_string(), "IDs are not matching");
        let internal: ContentError = anyhow::anyhow!("db down").into();
        assert!(internal.to_string().starts_with("Internal error"));
    }
}
