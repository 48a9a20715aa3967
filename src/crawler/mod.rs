//! Crawler module for page fetching and tree harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with a politeness delay
//! - Page classification and content extraction
//! - Root-to-target trail resolution
//! - The resumable depth-first orchestrator

mod extractor;
mod fetcher;
mod orchestrator;
mod resolver;

#[cfg(test)]
mod testing;

pub use extractor::{ChildLink, FieldExtractor, HtmlExtractor, PageSignals, RawSection};
pub use fetcher::{build_http_client, Document, FetchError, HttpFetcher, PageFetcher};
pub use orchestrator::{CrawlContext, Harvest, Harvester};
pub use resolver::PathResolver;
