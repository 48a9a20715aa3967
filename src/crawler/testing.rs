//! In-memory site used by resolver and harvester tests

use crate::crawler::{
    ChildLink, Document, FetchError, FieldExtractor, PageFetcher, PageSignals, RawSection,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub breadcrumb: Vec<String>,
    pub children: Vec<ChildLink>,
    pub is_leaf: bool,
    pub title: Option<String>,
    pub fragments: Vec<String>,
}

impl FakePage {
    pub fn category(children: &[(&str, &str)]) -> Self {
        Self {
            children: children
                .iter()
                .map(|(name, url)| ChildLink::new(*name, *url))
                .collect(),
            ..Self::default()
        }
    }

    pub fn leaf(title: &str, fragments: &[&str]) -> Self {
        Self {
            is_leaf: true,
            title: Some(title.to_string()),
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_breadcrumb(mut self, labels: &[&str]) -> Self {
        self.breadcrumb = labels.iter().map(|l| l.to_string()).collect();
        self
    }
}

/// Serves pages from a map and records every fetch
#[derive(Debug, Default)]
pub struct FakeSite {
    pages: HashMap<String, FakePage>,
    failing: HashSet<String>,
    fetches: RefCell<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.borrow().clone()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.borrow().iter().filter(|u| *u == url).count()
    }

    pub fn clear_fetches(&self) {
        self.fetches.borrow_mut().clear();
    }
}

impl PageFetcher for FakeSite {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        self.fetches.borrow_mut().push(url.to_string());

        if self.failing.contains(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            });
        }
        if !self.pages.contains_key(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            });
        }

        Ok(Document::new(url, ""))
    }
}

impl FieldExtractor for FakeSite {
    fn classify(&self, doc: &Document) -> PageSignals {
        let Some(page) = self.pages.get(&doc.url) else {
            return PageSignals::default();
        };

        PageSignals {
            is_leaf: page.is_leaf,
            title: page.title.clone(),
            breadcrumb: page.breadcrumb.clone(),
            children: page.children.clone(),
            sections: vec![RawSection {
                name: "content".to_string(),
                fragments: page.fragments.clone(),
            }],
        }
    }
}
