//! Swatch Scraper - catalog image harvester
//!
//! Fetches a fixed list of product pages, classifies each product by color
//! code and material category, picks the best product image and stores it
//! in a per-category directory, then writes a JSON run report.

pub mod application;
pub mod domain;
pub mod infrastructure;
