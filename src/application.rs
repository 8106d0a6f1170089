//! Application layer module
//!
//! Orchestrates the domain rules and infrastructure into a catalog run.

pub mod error;
pub mod pipeline;
pub mod report;

pub use error::ScrapeError;
pub use pipeline::CatalogPipeline;
pub use report::{CategoryCounts, RunReport, RunSummary};
