//! Product image selection
//!
//! Extracts every plausible image reference from a product page, filters out
//! site chrome (logos, icons, banners...), scores what remains with URL
//! heuristics and resolves the winner to an absolute URL.

#![allow(clippy::uninlined_format_args)]

use super::config::ImageSelectorConfig;
use super::context::PageContext;
use super::{ContextualParser, ParsingError, ParsingResult};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// Substrings earning the resolution bonus when scoring
const QUALITY_MARKERS: &[&str] = &["large", "zoom", "full", "hd"];
const QUALITY_BONUS: f64 = 10.0;
const PRODUCT_MARKER: &str = "product";
const PRODUCT_BONUS: f64 = 5.0;
const JPEG_BONUS: f64 = 3.0;
const PNG_BONUS: f64 = 2.0;
/// Tie-breaker favoring longer, more descriptive paths
const LENGTH_WEIGHT: f64 = 0.01;

/// A scored image reference
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCandidate {
    pub reference: String,
    pub score: f64,
}

/// Winning image for a page
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    /// Absolute URL of the image
    pub url: String,
    /// Reference as it appeared in the markup
    pub reference: String,
    pub score: f64,
    /// Number of candidates that survived filtering
    pub candidates_considered: usize,
}

/// Image selector with compiled selectors and class patterns
pub struct ImageSelector {
    img_selector: Selector,
    main_image_selectors: Vec<Selector>,
    main_class: Regex,
    gallery_class: Regex,
    source_attributes: Vec<String>,
    resolution_hints: Vec<String>,
    exclusion_markers: Vec<String>,
}

impl ImageSelector {
    /// Create a selector with default configuration
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ImageSelectorConfig::default())
    }

    /// Create a selector with custom configuration
    pub fn with_config(config: &ImageSelectorConfig) -> ParsingResult<Self> {
        let img_selector = Selector::parse("img").map_err(|e| ParsingError::invalid_selector("img", e))?;
        let main_class = Regex::new(&config.main_class_pattern)
            .map_err(|e| ParsingError::invalid_pattern(&config.main_class_pattern, e))?;
        let gallery_class = Regex::new(&config.gallery_class_pattern)
            .map_err(|e| ParsingError::invalid_pattern(&config.gallery_class_pattern, e))?;

        let lowercase = |items: &[String]| items.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>();

        Ok(Self {
            img_selector,
            main_image_selectors: compile_selectors(&config.main_image_selectors)?,
            main_class,
            gallery_class,
            source_attributes: config.source_attributes.clone(),
            resolution_hints: lowercase(&config.resolution_hints),
            exclusion_markers: lowercase(&config.exclusion_markers),
        })
    }

    /// Parse markup and pick the best product image
    pub fn select_best_image(&self, markup: &str, page_url: &str) -> ParsingResult<SelectedImage> {
        let html = Html::parse_document(markup);
        self.select_from_document(&html, page_url)
    }

    /// Pick the best product image from an already parsed document
    pub fn select_from_document(&self, html: &Html, page_url: &str) -> ParsingResult<SelectedImage> {
        let extracted = self.extract_candidates(html);
        let extracted_count = extracted.len();
        let candidates = self.filter_candidates(extracted);

        debug!(
            "Image candidates for {}: {} extracted, {} after filtering",
            page_url,
            extracted_count,
            candidates.len()
        );

        let best = pick_best(&candidates).ok_or(ParsingError::NoImageFound {
            candidates_seen: extracted_count,
        })?;
        let url = resolve_reference(&best.reference, page_url)?;

        debug!("Selected image {} (score {:.2})", url, best.score);
        Ok(SelectedImage {
            url,
            reference: best.reference,
            score: best.score,
            candidates_considered: candidates.len(),
        })
    }

    /// Collect raw image references in extraction order
    pub fn extract_candidates(&self, html: &Html) -> Vec<String> {
        let mut found = Vec::new();

        // Main product image regions
        if let Some(src) = html
            .select(&self.img_selector)
            .find(|img| class_matches(*img, &self.main_class))
            .and_then(primary_source)
        {
            found.push(src);
        }
        for selector in &self.main_image_selectors {
            found.extend(html.select(selector).filter_map(primary_source));
        }

        // Gallery and zoom images
        found.extend(
            html.select(&self.img_selector)
                .filter(|img| class_matches(*img, &self.gallery_class))
                .filter_map(primary_source),
        );

        // Any attribute hinting at a high resolution asset
        for img in html.select(&self.img_selector) {
            for attribute in &self.source_attributes {
                if let Some(value) = img.value().attr(attribute).and_then(usable_reference) {
                    let lower = value.to_lowercase();
                    if self.resolution_hints.iter().any(|hint| lower.contains(hint.as_str())) {
                        found.push(value.to_string());
                    }
                }
            }
        }

        if found.is_empty() {
            debug!("No structural image hints found, falling back to every non-excluded image");
            found.extend(
                html.select(&self.img_selector)
                    .filter_map(|img| img.value().attr("src").and_then(usable_reference))
                    .filter(|src| !self.is_excluded(src))
                    .map(str::to_string),
            );
        }

        found
    }

    /// Deduplicate (first occurrence wins) and drop excluded references
    fn filter_candidates(&self, references: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        references
            .into_iter()
            .filter(|reference| seen.insert(reference.clone()))
            .filter(|reference| !self.is_excluded(reference))
            .collect()
    }

    fn is_excluded(&self, reference: &str) -> bool {
        let lower = reference.to_lowercase();
        self.exclusion_markers.iter().any(|marker| lower.contains(marker.as_str()))
    }
}

impl ContextualParser for ImageSelector {
    type Output = SelectedImage;
    type Context = PageContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        self.select_from_document(html, &context.url)
    }
}

/// Score a reference with the URL quality heuristics
pub fn score_reference(reference: &str) -> f64 {
    let lower = reference.to_lowercase();
    let mut score = 0.0;

    if QUALITY_MARKERS.iter().any(|marker| lower.contains(marker)) {
        score += QUALITY_BONUS;
    }
    if lower.contains(PRODUCT_MARKER) {
        score += PRODUCT_BONUS;
    }

    let path = lower.split(['?', '#']).next().unwrap_or(&lower);
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        score += JPEG_BONUS;
    } else if path.ends_with(".png") {
        score += PNG_BONUS;
    }

    score + reference.chars().count() as f64 * LENGTH_WEIGHT
}

/// Highest scoring candidate; ties go to the earliest one
pub fn pick_best(references: &[String]) -> Option<ImageCandidate> {
    let mut best: Option<ImageCandidate> = None;

    for reference in references {
        let score = score_reference(reference);
        if best.as_ref().is_none_or(|current| score > current.score) {
            best = Some(ImageCandidate {
                reference: reference.clone(),
                score,
            });
        }
    }

    best
}

/// Resolve a markup reference against the page it came from
pub fn resolve_reference(reference: &str, page_url: &str) -> ParsingResult<String> {
    if !reference.starts_with("//") && Url::parse(reference).is_ok() {
        return Ok(reference.to_string());
    }

    let base = Url::parse(page_url)
        .map_err(|e| ParsingError::url_resolution_failed(reference, e, Some(page_url)))?;

    if reference.starts_with("//") {
        return Ok(format!("{}:{}", base.scheme(), reference));
    }

    base.join(reference)
        .map(String::from)
        .map_err(|e| ParsingError::url_resolution_failed(reference, e, Some(page_url)))
}

/// Compile selector strings, skipping invalid ones unless all of them fail
fn compile_selectors(selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", selector_str, e);
                errors.push(format!("'{}': {}", selector_str, e));
            }
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(ParsingError::ConfigurationError {
            message: format!("no valid selectors compiled: {}", errors.join(", ")),
            field: "main_image_selectors".to_string(),
        });
    }

    Ok(selectors)
}

fn class_matches(element: ElementRef<'_>, pattern: &Regex) -> bool {
    element.value().attr("class").is_some_and(|class| pattern.is_match(class))
}

/// `src`, falling back to the deferred-load attribute
fn primary_source(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("src")
        .and_then(usable_reference)
        .or_else(|| element.value().attr("data-src").and_then(usable_reference))
        .map(str::to_string)
}

/// Trimmed, non-empty reference that can be fetched (inline data URIs cannot)
fn usable_reference(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && !value.starts_with("data:")).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://www.emaux-soyer.com/en/bleu-62f-en-poudre.html";

    fn selector() -> ImageSelector {
        ImageSelector::new().unwrap()
    }

    #[test]
    fn test_large_product_jpeg_beats_thumbnail_png() {
        let candidates = vec!["foo/product-large.jpg".to_string(), "foo/thumb.png".to_string()];
        let best = pick_best(&candidates).unwrap();
        assert_eq!(best.reference, "foo/product-large.jpg");
        assert!(best.score >= 18.0);
        assert!((score_reference("foo/thumb.png") - 2.13).abs() < 1e-9);
    }

    #[test]
    fn test_ties_resolve_to_first_extracted() {
        let candidates = vec!["a/one.jpg".to_string(), "b/two.jpg".to_string()];
        assert_eq!(pick_best(&candidates).unwrap().reference, "a/one.jpg");
    }

    #[test]
    fn test_extension_ignores_query_string() {
        assert!(score_reference("x/pic.jpeg?v=3") > score_reference("x/pic.gif?v=3"));
    }

    #[test]
    fn test_selects_main_product_image() {
        let markup = r#"
            <html><body>
              <img class="logo" src="/static/logo.png">
              <img class="product-image-main" src="/media/catalog/product/cache/1/image/62f.jpg">
              <img src="/media/thumb/62f-small.jpg">
            </body></html>"#;
        let selected = selector().select_best_image(markup, PAGE).unwrap();
        assert_eq!(
            selected.url,
            "https://www.emaux-soyer.com/media/catalog/product/cache/1/image/62f.jpg"
        );
        assert_eq!(selected.candidates_considered, 1);
    }

    #[test]
    fn test_resolution_hint_attributes_are_candidates() {
        let markup = r#"
            <img src="/media/p/62f.jpg" data-zoom-image="/media/zoom/62f-full.jpg">"#;
        let selected = selector().select_best_image(markup, PAGE).unwrap();
        assert_eq!(selected.url, "https://www.emaux-soyer.com/media/zoom/62f-full.jpg");
    }

    #[test]
    fn test_fallback_uses_non_excluded_images() {
        let markup = r#"
            <img src="/skin/nav-arrow.png">
            <img src="/media/62f.png">"#;
        let selected = selector().select_best_image(markup, PAGE).unwrap();
        assert_eq!(selected.url, "https://www.emaux-soyer.com/media/62f.png");
    }

    #[test]
    fn test_only_site_chrome_yields_no_image() {
        let markup = r#"
            <img src="/skin/logo.png">
            <img class="product-image" src="/media/placeholder/default/large.jpg">"#;
        let err = selector().select_best_image(markup, PAGE).unwrap_err();
        assert!(matches!(err, ParsingError::NoImageFound { .. }));
        assert!(err.to_string().contains("no suitable image found"));
    }

    #[test]
    fn test_empty_page_yields_no_image() {
        let err = selector().select_best_image("<html></html>", PAGE).unwrap_err();
        assert!(matches!(err, ParsingError::NoImageFound { candidates_seen: 0 }));
    }

    #[test]
    fn test_duplicates_collapse() {
        let markup = r#"<img class="product-image-main gallery" src="/media/catalog/product/large/62f.jpg">"#;
        let selected = selector().select_best_image(markup, PAGE).unwrap();
        assert_eq!(selected.candidates_considered, 1);
    }

    #[test]
    fn test_resolve_protocol_relative() {
        assert_eq!(
            resolve_reference("//cdn.example.com/a.jpg", PAGE).unwrap(),
            "https://cdn.example.com/a.jpg"
        );
        assert_eq!(
            resolve_reference("//cdn.example.com/a.jpg", "http://shop.test/p.html").unwrap(),
            "http://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        assert_eq!(
            resolve_reference("media/a.jpg", PAGE).unwrap(),
            "https://www.emaux-soyer.com/en/media/a.jpg"
        );
        assert_eq!(
            resolve_reference("/media/a.jpg", PAGE).unwrap(),
            "https://www.emaux-soyer.com/media/a.jpg"
        );
        assert_eq!(
            resolve_reference("https://img.test/A.JPG?x=1", "not a url").unwrap(),
            "https://img.test/A.JPG?x=1"
        );
    }

    #[test]
    fn test_resolve_against_invalid_page_url() {
        let err = resolve_reference("/media/a.jpg", "not a url").unwrap_err();
        assert!(matches!(err, ParsingError::UrlResolutionFailed { .. }));
    }

    #[test]
    fn test_invalid_class_pattern_is_rejected() {
        let config = ImageSelectorConfig {
            gallery_class_pattern: "(".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ImageSelector::with_config(&config),
            Err(ParsingError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_all_invalid_selectors_are_rejected() {
        let config = ImageSelectorConfig {
            main_image_selectors: vec!["img[".to_string()],
            ..Default::default()
        };
        assert!(ImageSelector::with_config(&config).is_err());
    }
}
