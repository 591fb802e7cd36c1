// src/error.rs
use thiserror::Error;

/// Errors a search can surface to its caller.
///
/// Extraction failures never show up here: the fallback chain absorbs them.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },
}

impl SearchError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SearchError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SearchError::Validation { .. } => "VALIDATION_ERROR",
        }
    }
}

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("LinkedIn OAuth credentials not configured")]
    NotConfigured,
    #[error("Invalid or expired OAuth state")]
    InvalidState,
    #[error("Token exchange failed: {0}")]
    Exchange(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl OAuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            OAuthError::NotConfigured => "OAUTH_NOT_CONFIGURED",
            OAuthError::InvalidState => "INVALID_STATE",
            OAuthError::Exchange(_) => "TOKEN_EXCHANGE_FAILED",
            OAuthError::Store(_) => "STORAGE_ERROR",
        }
    }
}
