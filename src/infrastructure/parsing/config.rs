//! Parsing configuration for product page extraction
//!
//! Centralized configuration for CSS selectors and image heuristics.

use serde::{Deserialize, Serialize};

/// Selectors and markers used to locate the product image and title
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSelectorConfig {
    /// CSS selectors for known "main product image" regions
    pub main_image_selectors: Vec<String>,

    /// Class pattern identifying the main product image element
    pub main_class_pattern: String,

    /// Class pattern identifying gallery / zoom images
    pub gallery_class_pattern: String,

    /// Attributes inspected for resolution hints (primary, deferred-load, zoom)
    pub source_attributes: Vec<String>,

    /// Substrings that suggest a high resolution asset
    pub resolution_hints: Vec<String>,

    /// Substrings that mark non-product images
    pub exclusion_markers: Vec<String>,

    /// Title selectors, first non-empty match wins
    pub title_selectors: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for ImageSelectorConfig {
    fn default() -> Self {
        Self {
            main_image_selectors: strings(&[
                "img.product-image-main",
                ".product-image-main img",
                ".fotorama__img",
                ".gallery-image img",
                ".product-media img",
                "img[src*='catalog/product']",
            ]),
            main_class_pattern: r"(?i)product.*image|main.*image".to_string(),
            gallery_class_pattern: r"(?i)gallery|zoom|product".to_string(),
            source_attributes: strings(&["src", "data-src", "data-zoom-image"]),
            resolution_hints: strings(&["large", "zoom", "full", "hd", "high", "original"]),
            exclusion_markers: strings(&[
                "logo",
                "icon",
                "banner",
                "nav",
                "footer",
                "placeholder",
                "default",
            ]),
            title_selectors: strings(&["h1", "title"]),
        }
    }
}
