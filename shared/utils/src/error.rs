use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum BaaError {
    #[error("Document unreadable: {message}")]
    DocumentUnreadable { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Fragments not ready for page {page}")]
    FragmentsNotReady { page: u32 },
}

impl BaaError {
    pub fn document_unreadable(message: impl Into<String>) -> Self {
        Self::DocumentUnreadable {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DocumentUnreadable { .. } => "DOCUMENT_UNREADABLE",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::FragmentsNotReady { .. } => "FRAGMENTS_NOT_READY",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::DocumentUnreadable { .. } => 422,
            Self::Validation { .. } => 400,
            Self::Configuration { .. } => 500,
            Self::NotFound { .. } => 404,
            Self::FragmentsNotReady { .. } => 409,
        }
    }
}

pub type BaaResult<T> = Result<T, BaaError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<BaaError> for ErrorResponse {
    fn from(error: BaaError) -> Self {
        let details = match &error {
            BaaError::Validation { field, .. } => Some(serde_json::json!({ "field": field })),
            _ => None,
        };

        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}
