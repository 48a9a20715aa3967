//! Configuration module for Canopy
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use canopy::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("canopy.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_boilerplate_patterns, Config, ConsolidationConfig, CrawlerConfig, ExtractorConfig,
    LinkConfig, OutputConfig, ResolverConfig, SectionSelector, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
