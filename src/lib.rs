//! Canopy: a resumable category-tree harvester
//!
//! This crate walks the category hierarchy of a large content site depth-first,
//! checkpointing after every node so an interrupted crawl resumes where it
//! stopped, and attaches consolidated, deduplicated text to the leaves.

pub mod config;
pub mod consolidate;
pub mod crawler;
pub mod output;
pub mod state;
pub mod tree;
pub mod url;

use thiserror::Error;

/// Main error type for Canopy operations
#[derive(Debug, Error)]
pub enum CanopyError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("State error: {0}")]
    State(#[from] state::StateError),

    #[error("Session failed: {0}")]
    Session(String),
}

impl CanopyError {
    /// Returns true if the error is contained at the boundary of a single node.
    ///
    /// A page that cannot be fetched marks that node Failed and the traversal
    /// moves on. Checkpoint and session errors end the session.
    pub fn is_node_scoped(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Canopy operations
pub type Result<T> = std::result::Result<T, CanopyError>;

// Re-export commonly used types
pub use config::Config;
pub use consolidate::Consolidator;
pub use crawler::{Harvester, HtmlExtractor, HttpFetcher, PathResolver};
pub use state::{CrawlState, SessionStatus, StateStore};
pub use tree::{build_chain, Crumb, NodeKind, TreeNode};
pub use url::normalize_url;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_only_fetch_errors_are_node_scoped() {
        let fetch: CanopyError = crawler::FetchError::Status {
            url: "https://example.com/Device/Phone".to_string(),
            status: 503,
        }
        .into();
        assert!(fetch.is_node_scoped());

        let state: CanopyError = state::StateError::Write {
            path: PathBuf::from("state/abc.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        }
        .into();
        assert!(!state.is_node_scoped());
        assert!(!CanopyError::Session("Empty trail".to_string()).is_node_scoped());
    }
}
