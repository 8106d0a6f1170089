//! Per-entry error taxonomy
//!
//! Every variant is caught at the entry boundary and turned into a
//! `Failed` outcome; none of them stops the run.

use crate::domain::FailureStage;
use crate::infrastructure::{DownloadError, FetchError, ParsingError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    /// The product page could not be fetched
    #[error(transparent)]
    Fetch(FetchError),

    #[error("no color code found in URL or title")]
    Unclassifiable,

    #[error(transparent)]
    Selection(#[from] ParsingError),

    /// The chosen image could not be fetched
    #[error(transparent)]
    Download(FetchError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScrapeError {
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::Fetch(_) => FailureStage::Fetch,
            Self::Unclassifiable => FailureStage::Classification,
            Self::Selection(_) => FailureStage::Selection,
            Self::Download(_) => FailureStage::Download,
            Self::Write { .. } => FailureStage::Write,
        }
    }
}

impl From<DownloadError> for ScrapeError {
    fn from(error: DownloadError) -> Self {
        match error {
            DownloadError::Fetch(e) => Self::Download(e),
            DownloadError::Write { path, source } => Self::Write { path, source },
        }
    }
}
