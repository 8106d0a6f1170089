//! HTML parsing infrastructure for product pages
//!
//! Trait-based parsers working on an already parsed `scraper::Html`, so the
//! document is built once per page and never crosses an await point.

pub mod config;
pub mod context;
pub mod error;
pub mod image_selector;
pub mod product_page_parser;

// Re-export public types
pub use config::ImageSelectorConfig;
pub use context::PageContext;
pub use error::{ParsingError, ParsingResult};
pub use image_selector::{ImageCandidate, ImageSelector, SelectedImage};
pub use product_page_parser::{ProductPage, ProductPageParser};

use scraper::Html;

/// Parser trait with context support
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse HTML with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}
