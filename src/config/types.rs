use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Canopy
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub links: LinkConfig,
    #[serde(default)]
    pub consolidation: ConsolidationConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum depth below the attachment point that is still expanded
    pub max_depth: u32,

    /// Maximum number of children followed per category page
    pub max_fan_out: u32,

    /// Lower bound of the randomized delay after each fetch (milliseconds)
    pub delay_min_ms: u64,

    /// Upper bound of the randomized delay after each fetch (milliseconds)
    pub delay_max_ms: u64,

    /// Request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Log a progress line every this many completed nodes
    pub progress_interval: u64,

    /// Extract content for the session target even when it lists children
    pub treat_target_as_leaf: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_fan_out: 200,
            delay_min_ms: 500,
            delay_max_ms: 1500,
            request_timeout_secs: 30,
            progress_interval: 10,
            treat_target_as_leaf: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory holding one checkpoint file per target
    pub state_dir: String,

    /// Path the final tree is written to as JSON
    pub tree_path: String,

    /// Optional path for a Markdown outline of the tree
    #[serde(default)]
    pub summary_path: Option<String>,
}

/// Breadcrumb path reconstruction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// URL of the conventional root of the category tree
    pub root_url: String,

    /// Display label of the root node
    #[serde(default = "default_root_name")]
    pub root_name: String,

    /// Base URL fallback category URLs are synthesized under
    #[serde(default)]
    pub category_base: Option<String>,

    /// Character that replaces whitespace in synthesized slugs
    #[serde(default = "default_join_char")]
    pub join_char: char,

    /// How many levels the last-resort search descends from the root
    #[serde(default = "default_search_depth")]
    pub search_depth: u32,

    /// Maximum number of pages the last-resort search may fetch
    #[serde(default = "default_search_budget")]
    pub search_budget: u32,

    /// Trailing qualifier words ignored when comparing labels
    #[serde(default = "default_generic_suffixes")]
    pub generic_suffixes: Vec<String>,

    /// Known synonyms: label -> alternative labels
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl ResolverConfig {
    /// The base URL fallback slugs are joined onto
    pub fn category_base(&self) -> &str {
        self.category_base.as_deref().unwrap_or(&self.root_url)
    }
}

fn default_root_name() -> String {
    "Root".to_string()
}

fn default_join_char() -> char {
    '_'
}

fn default_search_depth() -> u32 {
    3
}

fn default_search_budget() -> u32 {
    40
}

fn default_generic_suffixes() -> Vec<String> {
    ["repair", "parts", "guides", "devices", "category"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Child link filtering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LinkConfig {
    /// Case-insensitive patterns marking non-category links, matched on URL
    /// segment boundaries
    pub deny_patterns: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            deny_patterns: [
                "/edit",
                "/history",
                "revision",
                "/new/",
                "/create",
                "/answers",
                "action=edit",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Content consolidation thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConsolidationConfig {
    /// Sentence pairs with a token Jaccard above this are duplicates
    pub sentence_similarity: f64,

    /// Fragments whose duplicate-sentence share exceeds this are dropped whole
    pub fragment_redundancy: f64,

    /// Paragraph pairs with a token Jaccard above this are collapsed
    pub paragraph_similarity: f64,

    /// A paragraph may end at a natural boundary once it has this many sentences
    pub min_paragraph_sentences: usize,

    /// A paragraph always ends at this many sentences
    pub max_paragraph_sentences: usize,

    /// Regular expressions marking boilerplate sentences
    pub boilerplate_patterns: Vec<String>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            sentence_similarity: 0.9,
            fragment_redundancy: 0.35,
            paragraph_similarity: 0.8,
            min_paragraph_sentences: 3,
            max_paragraph_sentences: 5,
            boilerplate_patterns: default_boilerplate_patterns(),
        }
    }
}

/// Default boilerplate set: prices, calls to action, ratings, navigation text
pub fn default_boilerplate_patterns() -> Vec<String> {
    [
        r"[$€£¥]\s?\d",
        r"(?i)\b\d+(?:[.,]\d{2})?\s?(?:usd|eur|gbp)\b",
        r"(?i)\b(?:buy|shop|order)\s+now\b",
        r"(?i)\badd\s+to\s+(?:cart|basket|wishlist)\b",
        r"(?i)\bfree\s+shipping\b",
        r"(?i)\b\d+(?:\.\d)?\s*(?:out\s+of\s+5|stars?)\b",
        r"(?i)\b\d+\s+(?:reviews?|ratings?)\b",
        r"(?i)\b(?:skip\s+to\s+(?:main\s+)?content|back\s+to\s+top)\b",
        r"(?i)^(?:home|menu|next|previous|sign\s+in|log\s+in)\.?$",
        r"(?i)\bclick\s+here\b",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// CSS selectors used by the HTML field extractor
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractorConfig {
    /// Elements whose text forms the breadcrumb trail, in order
    pub breadcrumb_selector: String,

    /// Anchors pointing at sub-categories
    pub child_selector: String,

    /// Presence of any match marks the page as a terminal item
    pub leaf_selector: String,

    /// Element holding the page title
    pub title_selector: String,

    /// Named content sections whose matching elements yield raw fragments
    pub sections: Vec<SectionSelector>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            breadcrumb_selector: "nav.breadcrumb a, .breadcrumbs a".to_string(),
            child_selector: ".category-list a[href]".to_string(),
            leaf_selector: "[data-leaf], .item-content".to_string(),
            title_selector: "h1".to_string(),
            sections: vec![SectionSelector {
                name: "content".to_string(),
                selector: "article p, article li".to_string(),
            }],
        }
    }
}

/// A named content section and the selector that yields its fragments
#[derive(Debug, Clone, Deserialize)]
pub struct SectionSelector {
    pub name: String,
    pub selector: String,
}
