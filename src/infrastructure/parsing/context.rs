//! Parsing context for product page extraction

/// Context information for parsing a single product page
#[derive(Debug, Clone)]
pub struct PageContext {
    /// URL the markup was fetched from; base for resolving relative references
    pub url: String,
}

impl PageContext {
    /// Create new page context
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}
