//! Domain layer - catalog, classification rules and per-entry outcomes
//!
//! Nothing in here performs I/O.

pub mod catalog;
pub mod classification;
pub mod outcome;

pub use catalog::{Catalog, CatalogEntry};
pub use classification::{
    Category, CategoryRule, ClassificationConfig, ClassificationResult, Classifier, CodeRange,
    ColorCodeRule, NumericRangeRule,
};
pub use outcome::{DownloadOutcome, FailureDetails, FailureStage};
