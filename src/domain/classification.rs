//! Color code and material category classification
//!
//! Classification is a pure function of the product URL, the page title and
//! (optionally) the visible page text. Both halves are driven by ordered rule
//! records evaluated first-match-wins, so precedence lives in data rather than
//! in nested conditionals.

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Material appearance of an enamel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Transparent,
    Opaque,
    Opal,
    Unknown,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Transparent, Self::Opaque, Self::Opal, Self::Unknown];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transparent => "transparent",
            Self::Opaque => "opaque",
            Self::Opal => "opal",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    /// Upper-cased, hyphen-free color code; `None` when no rule matched
    pub color_code: Option<String>,
    pub category: Category,
}

/// One color code extraction rule; the first capture group is the code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorCodeRule {
    pub name: String,
    pub pattern: String,
}

/// Keyword rule: any keyword present in the search text selects `category`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Inclusive range of color numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRange {
    pub start: u32,
    pub end: u32,
}

impl CodeRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.start..=self.end).contains(&value)
    }
}

/// Numeric fallback rule, tuned to one vendor's numbering scheme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericRangeRule {
    pub category: Category,
    #[serde(default)]
    pub ranges: Vec<CodeRange>,
    #[serde(default)]
    pub codes: Vec<u32>,
}

impl NumericRangeRule {
    pub fn matches(&self, value: u32) -> bool {
        self.ranges.iter().any(|range| range.contains(value)) || self.codes.contains(&value)
    }
}

/// Classification rule tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Color code rules in priority order
    pub color_code_rules: Vec<ColorCodeRule>,

    /// Keyword rules in priority order (opal, transparent, opaque)
    pub category_rules: Vec<CategoryRule>,

    /// Numeric fallback rules, consulted after every keyword rule missed
    pub numeric_rules: Vec<NumericRangeRule>,

    /// Category used when no rule matches
    pub default_category: Category,

    /// Also search the visible page text for category keywords
    pub include_page_text: bool,
}

const SUFFIXES: &str = "en-poudre|en-grains|en-morceaux|powder|poudre|150g|150-gr";

impl Default for ClassificationConfig {
    fn default() -> Self {
        let keywords = |words: &[&str]| -> Vec<String> { words.iter().map(|w| (*w).to_string()).collect() };

        Self {
            color_code_rules: vec![
                ColorCodeRule {
                    name: "code_before_suffix".to_string(),
                    pattern: format!(r"(\d+[a-zA-Z]*)-?(?:{SUFFIXES})"),
                },
                ColorCodeRule {
                    name: "number_with_flag_before_suffix".to_string(),
                    pattern: format!(r"(\d+)-?[fF]?-?(?:{SUFFIXES})"),
                },
                ColorCodeRule {
                    name: "letter_prefixed_token".to_string(),
                    pattern: r"([a-zA-Z]+-\d+)".to_string(),
                },
                ColorCodeRule {
                    name: "bare_number".to_string(),
                    pattern: r"(\d+)".to_string(),
                },
            ],
            category_rules: vec![
                CategoryRule {
                    category: Category::Opal,
                    keywords: keywords(&["opal", "opale", "opalescent"]),
                },
                CategoryRule {
                    category: Category::Transparent,
                    keywords: keywords(&["transparent", "translucent", "clear", "cristal", "crystal"]),
                },
                CategoryRule {
                    category: Category::Opaque,
                    keywords: keywords(&["opaque", "opaq", "mat"]),
                },
            ],
            numeric_rules: vec![
                NumericRangeRule {
                    category: Category::Transparent,
                    ranges: vec![
                        CodeRange::new(2000, 2999),
                        CodeRange::new(4000, 4999),
                        CodeRange::new(1040, 1049),
                    ],
                    codes: vec![104, 111, 194, 1942, 383, 388, 29, 31, 39, 40, 41, 53],
                },
                NumericRangeRule {
                    category: Category::Opal,
                    ranges: vec![CodeRange::new(600, 649)],
                    codes: vec![101, 607, 609, 610, 8],
                },
            ],
            default_category: Category::Opaque,
            include_page_text: false,
        }
    }
}

struct CompiledColorRule {
    name: String,
    regex: Regex,
}

/// Compiled classifier
pub struct Classifier {
    color_rules: Vec<CompiledColorRule>,
    category_rules: Vec<CategoryRule>,
    numeric_rules: Vec<NumericRangeRule>,
    default_category: Category,
    include_page_text: bool,
}

impl Classifier {
    /// Compile the rule tables; fails on the first invalid pattern
    pub fn new(config: &ClassificationConfig) -> Result<Self, regex::Error> {
        let color_rules = config
            .color_code_rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern).map(|regex| CompiledColorRule {
                    name: rule.name.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let category_rules = config
            .category_rules
            .iter()
            .map(|rule| CategoryRule {
                category: rule.category,
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();

        Ok(Self {
            color_rules,
            category_rules,
            numeric_rules: config.numeric_rules.clone(),
            default_category: config.default_category,
            include_page_text: config.include_page_text,
        })
    }

    pub fn includes_page_text(&self) -> bool {
        self.include_page_text
    }

    pub fn classify(&self, url: &str, title: &str) -> ClassificationResult {
        self.classify_with_text(url, title, None)
    }

    /// Classify with optional page body text (ignored unless enabled in config)
    pub fn classify_with_text(&self, url: &str, title: &str, page_text: Option<&str>) -> ClassificationResult {
        let color_code = self.extract_color_code(url, title);
        let page_text = if self.include_page_text { page_text } else { None };
        let category = self.determine_category(url, title, page_text, color_code.as_deref());

        ClassificationResult { color_code, category }
    }

    /// Run every color rule against the last path segment, then against the title
    pub fn extract_color_code(&self, url: &str, title: &str) -> Option<String> {
        let segment = final_path_segment(url);

        for (source, text) in [("url", segment.as_str()), ("title", title)] {
            for rule in &self.color_rules {
                if let Some(code) = rule.regex.captures(text).and_then(|c| c.get(1)) {
                    debug!("Color code rule '{}' matched {} text: {}", rule.name, source, code.as_str());
                    return Some(code.as_str().to_uppercase().replace('-', ""));
                }
            }
        }

        None
    }

    fn determine_category(
        &self,
        url: &str,
        title: &str,
        page_text: Option<&str>,
        color_code: Option<&str>,
    ) -> Category {
        let mut text = format!("{url} {title}");
        if let Some(page_text) = page_text {
            text.push(' ');
            text.push_str(page_text);
        }
        let text = text.to_lowercase();

        if let Some(rule) = self
            .category_rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| text.contains(k.as_str())))
        {
            return rule.category;
        }

        let number = color_code.and_then(leading_number).unwrap_or(0);
        self.numeric_rules
            .iter()
            .find(|rule| rule.matches(number))
            .map_or(self.default_category, |rule| rule.category)
    }
}

/// Last non-empty path segment of a URL, percent-decoded, without query or fragment
fn final_path_segment(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        {
            return percent_decode_str(segment).decode_utf8_lossy().into_owned();
        }
    }

    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query);
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// First run of ASCII digits in a color code
fn leading_number(code: &str) -> Option<u32> {
    let digits: String = code
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
