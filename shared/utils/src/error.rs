use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DealsightError {
    /// Signals disagree; never resolved silently
    #[error("Ambiguous {subject}: {}", signals.join("; "))]
    Ambiguity { subject: String, signals: Vec<String> },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Table source error: {message}")]
    TableSource { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DealsightError {
    pub fn ambiguity(subject: impl Into<String>, signals: Vec<String>) -> Self {
        Self::Ambiguity {
            subject: subject.into(),
            signals,
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

    pub fn table_source(message: impl Into<String>) -> Self {
        Self::TableSource {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ambiguity { .. } => "AMBIGUITY_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::TableSource { .. } => "TABLE_SOURCE_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Ambiguity { .. } => 409,
            Self::Validation { .. } => 422,
            Self::Configuration { .. } => 500,
            Self::TableSource { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }
}

pub type DealsightResult<T> = Result<T, DealsightError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<DealsightError> for ErrorResponse {
    fn from(error: DealsightError) -> Self {
        // Conflicting signals are surfaced to the caller as structured detail
        let details = match &error {
            DealsightError::Ambiguity { subject, signals } => Some(serde_json::json!({
                "subject": subject,
                "signals": signals,
            })),
            DealsightError::Validation { field, .. } => Some(serde_json::json!({ "field": field })),
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

impl From<serde_json::Error> for DealsightError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

impl From<config::ConfigError> for DealsightError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

impl From<csv::Error> for DealsightError {
    fn from(error: csv::Error) -> Self {
        Self::table_source(error.to_string())
    }
}
