//! Parsing error types for product page analysis
//!
//! Markup from the remote site is assumed but never guaranteed, so every
//! extraction step reports failure through these variants instead of
//! returning partial data.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("no suitable image found ({candidates_seen} candidates rejected)")]
    NoImageFound { candidates_seen: usize },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String, field: String },
}

impl ParsingError {
    /// Create a URL resolution error against a base page
    pub fn url_resolution_failed(url: &str, reason: impl ToString, base_url: Option<&str>) -> Self {
        Self::UrlResolutionFailed {
            url: url.to_string(),
            reason: reason.to_string(),
            base_url: base_url.map(str::to_string),
        }
    }

    /// Create an invalid selector error
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid regex pattern error
    pub fn invalid_pattern(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error comes from the page rather than from configuration
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NoImageFound { .. } | Self::UrlResolutionFailed { .. } => true,
            Self::InvalidSelector { .. } | Self::InvalidPattern { .. } | Self::ConfigurationError { .. } => false,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
