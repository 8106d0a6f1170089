//! Product page parser
//!
//! Pulls the title, visible text and best image out of a fetched product page.

#![allow(clippy::uninlined_format_args)]

use super::config::ImageSelectorConfig;
use super::context::PageContext;
use super::image_selector::{ImageSelector, SelectedImage};
use super::{ContextualParser, ParsingError, ParsingResult};
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Everything the pipeline needs from one product page
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub url: String,
    pub title: Option<String>,
    /// Collapsed visible text, only populated when requested
    pub text: Option<String>,
    pub image: ParsingResult<SelectedImage>,
}

/// Product page parser with compiled selectors
pub struct ProductPageParser {
    title_selectors: Vec<Selector>,
    body_selector: Selector,
    image_selector: ImageSelector,
    capture_text: bool,
}

impl ProductPageParser {
    /// Create a parser with default configuration
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ImageSelectorConfig::default())
    }

    /// Create a parser with custom configuration
    pub fn with_config(config: &ImageSelectorConfig) -> ParsingResult<Self> {
        let mut title_selectors = Vec::new();
        for selector_str in &config.title_selectors {
            match Selector::parse(selector_str) {
                Ok(selector) => title_selectors.push(selector),
                Err(e) => warn!("Failed to compile title selector '{}': {}", selector_str, e),
            }
        }

        Ok(Self {
            title_selectors,
            body_selector: Selector::parse("body").map_err(|e| ParsingError::invalid_selector("body", e))?,
            image_selector: ImageSelector::with_config(config)?,
            capture_text: false,
        })
    }

    /// Also capture the page's visible text
    #[must_use]
    pub fn with_text_capture(mut self, capture: bool) -> Self {
        self.capture_text = capture;
        self
    }

    /// Parse raw markup fetched from `url`
    pub fn parse_page(&self, markup: &str, url: &str) -> ProductPage {
        let html = Html::parse_document(markup);
        self.parse_document(&html, &PageContext::new(url))
    }

    /// First non-empty title candidate, whitespace collapsed
    pub fn extract_title(&self, html: &Html) -> Option<String> {
        self.title_selectors.iter().find_map(|selector| {
            html.select(selector)
                .map(|element| collapse_whitespace(&element.text().collect::<String>()))
                .find(|title| !title.is_empty())
        })
    }

    /// Visible body text, falling back to the whole document
    pub fn extract_text(&self, html: &Html) -> String {
        let raw: Vec<&str> = match html.select(&self.body_selector).next() {
            Some(body) => body.text().collect(),
            None => html.root_element().text().collect(),
        };
        collapse_whitespace(&raw.join(" "))
    }

    fn parse_document(&self, html: &Html, context: &PageContext) -> ProductPage {
        let title = self.extract_title(html);
        if title.is_none() {
            debug!("No title found on {}", context.url);
        }

        ProductPage {
            url: context.url.clone(),
            title,
            text: self.capture_text.then(|| self.extract_text(html)),
            image: self.image_selector.parse_with_context(html, context),
        }
    }
}

impl ContextualParser for ProductPageParser {
    type Output = ProductPage;
    type Context = PageContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        Ok(self.parse_document(html, context))
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
