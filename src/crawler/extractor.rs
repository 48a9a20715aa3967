//! Field Extractor
//!
//! Turns a fetched document into the structured signals the harvester works
//! with. The harvester never inspects markup itself, so the selection rules
//! here can be swapped for a different site by implementing
//! [`FieldExtractor`].

use crate::config::ExtractorConfig;
use crate::crawler::Document;
use crate::url::{canonical, label_from_segment, last_segment};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

/// A link to a sub-category candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildLink {
    pub name: String,
    /// Absolute, canonical URL
    pub url: String,
}

impl ChildLink {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Raw text fragments for one named content section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub name: String,
    pub fragments: Vec<String>,
}

/// Everything the harvester needs to know about a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSignals {
    /// The page presents itself as a terminal content item
    pub is_leaf: bool,
    pub title: Option<String>,
    /// Ancestor labels from the root down to this page, inclusive
    pub breadcrumb: Vec<String>,
    /// Sub-category candidates in page order
    pub children: Vec<ChildLink>,
    pub sections: Vec<RawSection>,
}

impl PageSignals {
    /// Returns true if any section yielded text
    pub fn has_fragments(&self) -> bool {
        self.sections.iter().any(|s| !s.fragments.is_empty())
    }
}

/// Classifies fetched pages
pub trait FieldExtractor {
    fn classify(&self, doc: &Document) -> PageSignals;
}

impl<T: FieldExtractor> FieldExtractor for &T {
    fn classify(&self, doc: &Document) -> PageSignals {
        (**self).classify(doc)
    }
}

/// CSS-selector driven extractor
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    breadcrumb: Selector,
    children: Selector,
    leaf: Selector,
    title: Selector,
    sections: Vec<(String, Selector)>,
    json_ld: Selector,
    page_title: Selector,
}

impl HtmlExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        let sections = config
            .sections
            .iter()
            .map(|s| Ok((s.name.clone(), parse_selector(&s.selector)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            breadcrumb: parse_selector(&config.breadcrumb_selector)?,
            children: parse_selector(&config.child_selector)?,
            leaf: parse_selector(&config.leaf_selector)?,
            title: parse_selector(&config.title_selector)?,
            sections,
            json_ld: parse_selector(r#"script[type="application/ld+json"]"#)?,
            page_title: parse_selector("title")?,
        })
    }

    /// Breadcrumb labels from JSON-LD, falling back to the breadcrumb selector
    fn extract_breadcrumb(&self, document: &Html) -> Vec<String> {
        let from_json_ld = document
            .select(&self.json_ld)
            .filter_map(|script| serde_json::from_str::<Value>(&script.inner_html()).ok())
            .find_map(|value| breadcrumb_list(&value));

        if let Some(labels) = from_json_ld {
            return labels;
        }

        document
            .select(&self.breadcrumb)
            .map(element_text)
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        document
            .select(&self.title)
            .chain(document.select(&self.page_title))
            .map(element_text)
            .find(|s| !s.is_empty())
    }

    fn extract_children(&self, document: &Html, base_url: Option<&Url>) -> Vec<ChildLink> {
        let Some(base_url) = base_url else {
            return Vec::new();
        };

        let mut links = Vec::new();
        for element in document.select(&self.children) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            else {
                continue;
            };

            let mut name = element_text(element);
            if name.is_empty() {
                name = element
                    .value()
                    .attr("title")
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .or_else(|| last_segment(&url).map(|s| label_from_segment(&s, '_')))
                    .unwrap_or_else(|| url.clone());
            }

            links.push(ChildLink::new(name, url));
        }

        links
    }

    fn extract_sections(&self, document: &Html) -> Vec<RawSection> {
        self.sections
            .iter()
            .map(|(name, selector)| RawSection {
                name: name.clone(),
                fragments: document
                    .select(selector)
                    .map(element_text)
                    .filter(|s| !s.is_empty())
                    .collect(),
            })
            .collect()
    }
}

impl FieldExtractor for HtmlExtractor {
    fn classify(&self, doc: &Document) -> PageSignals {
        let document = Html::parse_document(&doc.body);
        let base_url = Url::parse(&doc.url).ok();

        PageSignals {
            is_leaf: document.select(&self.leaf).next().is_some(),
            title: self.extract_title(&document),
            breadcrumb: self.extract_breadcrumb(&document),
            children: self.extract_children(&document, base_url.as_ref()),
            sections: self.extract_sections(&document),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::Validation(format!("Invalid selector '{}': {:?}", selector, e)))
}

/// Element text with whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Finds a schema.org `BreadcrumbList` and returns its labels by position
fn breadcrumb_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items.iter().find_map(breadcrumb_list),
        Value::Object(map) => {
            let is_list = match map.get("@type") {
                Some(Value::String(t)) => t == "BreadcrumbList",
                Some(Value::Array(types)) => types.iter().any(|t| t == "BreadcrumbList"),
                _ => false,
            };

            if !is_list {
                return map.get("@graph").and_then(breadcrumb_list);
            }

            let elements = map.get("itemListElement")?.as_array()?;
            let mut labelled: Vec<(u64, String)> = elements
                .iter()
                .enumerate()
                .filter_map(|(index, element)| {
                    let name = element
                        .get("name")
                        .or_else(|| element.get("item").and_then(|i| i.get("name")))?
                        .as_str()?
                        .trim()
                        .to_string();
                    let position = element
                        .get("position")
                        .and_then(|p| p.as_u64().or_else(|| p.as_str()?.parse().ok()))
                        .unwrap_or(index as u64 + 1);
                    (!name.is_empty()).then_some((position, name))
                })
                .collect();

            labelled.sort_by_key(|(position, _)| *position);
            let labels: Vec<String> = labelled.into_iter().map(|(_, name)| name).collect();
            (!labels.is_empty()).then_some(labels)
        }
        _ => None,
    }
}

/// Resolves a link href to an absolute, canonical URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(canonical(absolute_url.as_str()))
    } else {
        None
    }
}
