//! Output module for exporting harvested trees
//!
//! This module handles:
//! - Writing the final tree as pretty JSON
//! - Rendering a Markdown outline with consolidated content
//! - Computing and printing tree and checkpoint statistics

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_outline, write_markdown_outline};
pub use stats::{print_state_status, print_tree_statistics, TreeStatistics};

use crate::state::{write_atomic, StateError};
use crate::tree::TreeNode;
use std::path::Path;
use thiserror::Error;

/// Output-specific errors
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to encode tree: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Write(#[from] StateError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes `tree` to `path` as pretty JSON, replacing any previous file atomically
pub fn write_tree_json(tree: &TreeNode, path: &Path) -> OutputResult<()> {
    let encoded = serde_json::to_vec_pretty(tree)?;
    write_atomic(path, &encoded)?;
    Ok(())
}
