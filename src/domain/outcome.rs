//! Per-entry terminal outcomes

use super::classification::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage at which an entry failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Fetch,
    Classification,
    Selection,
    Download,
    Write,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Classification => "classification",
            Self::Selection => "selection",
            Self::Download => "download",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// Entry facts known at the point of failure; later stages fill more of them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Terminal result recorded for exactly one catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Downloaded {
        url: String,
        title: String,
        color_code: String,
        category: Category,
        file_path: String,
        image_url: String,
        byte_size: u64,
    },
    Failed {
        url: String,
        stage: FailureStage,
        reason: String,
        /// What was learned about the entry before it failed
        #[serde(flatten)]
        details: FailureDetails,
    },
    Skipped {
        url: String,
        reason: String,
        color_code: String,
        category: Category,
        file_path: String,
        image_url: String,
    },
}

impl DownloadOutcome {
    pub const ALREADY_PRESENT: &'static str = "already present";

    pub fn url(&self) -> &str {
        match self {
            Self::Downloaded { url, .. } | Self::Failed { url, .. } | Self::Skipped { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Category of a freshly downloaded file
    pub fn downloaded_category(&self) -> Option<Category> {
        match self {
            Self::Downloaded { category, .. } => Some(*category),
            _ => None,
        }
    }
}
