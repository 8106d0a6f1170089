//! Catalog of product page URLs to process

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single product page URL
pub type CatalogEntry = String;

/// Ordered list of product pages; order is processing order only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Build from string literals, dropping repeated URLs
    pub fn from_unique<'a>(urls: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen = HashSet::new();
        let entries = urls
            .into_iter()
            .filter(|url| seen.insert(*url))
            .map(str::to_string)
            .collect();
        Self { entries }
    }

    /// Parse a catalog list: a JSON array of strings, or one URL per line
    /// with blank lines and `#` comments ignored
    pub fn parse_list(content: &str) -> Result<Self, serde_json::Error> {
        if content.trim_start().starts_with('[') {
            let entries: Vec<String> = serde_json::from_str(content)?;
            return Ok(Self::new(
                entries
                    .into_iter()
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect(),
            ));
        }

        Ok(Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
