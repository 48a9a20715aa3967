//! Statistics over harvested trees and checkpoints
//!
//! This module provides functionality for summarizing a tree's shape and
//! displaying a session's checkpoint.

use crate::state::CrawlState;
use crate::tree::TreeNode;

/// Shape of a harvested tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeStatistics {
    /// Total number of nodes
    pub nodes: usize,

    /// Nodes carrying content (mixed nodes included)
    pub leaves: usize,

    /// Leaves that also list children
    pub mixed: usize,

    /// Nodes without content
    pub categories: usize,

    /// Leaves whose content is empty
    pub empty_leaves: usize,

    /// Deepest level below the root
    pub max_depth: usize,
}

impl TreeStatistics {
    pub fn from_tree(tree: &TreeNode) -> Self {
        let mut stats = Self::default();

        tree.walk(&mut |node, depth| {
            stats.nodes += 1;
            stats.max_depth = stats.max_depth.max(depth);

            match &node.content {
                Some(content) => {
                    stats.leaves += 1;
                    if !node.children.is_empty() {
                        stats.mixed += 1;
                    }
                    if content.is_empty() {
                        stats.empty_leaves += 1;
                    }
                }
                None => stats.categories += 1,
            }
        });

        stats
    }
}

/// Prints tree statistics to stdout in a formatted manner
pub fn print_tree_statistics(stats: &TreeStatistics) {
    println!("=== Tree Statistics ===\n");

    println!("  Nodes: {}", stats.nodes);
    println!("  Categories: {}", stats.categories);
    println!(
        "  Leaves: {} ({} mixed, {} empty)",
        stats.leaves, stats.mixed, stats.empty_leaves
    );
    println!("  Max depth: {}", stats.max_depth);
    println!();
}

/// Prints a checkpoint to stdout
pub fn print_state_status(state: &CrawlState) {
    println!("=== Crawl Status ===\n");

    println!("Session:");
    println!("  Target: {}", state.target);
    println!("  Status: {}", state.status);
    if let Some(started) = state.started_at {
        println!("  Started: {}", started.to_rfc3339());
    }
    if let Some(updated) = state.updated_at {
        println!("  Updated: {}", updated.to_rfc3339());
    }
    if let Some(finished) = state.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(reason) = &state.failure_reason {
        println!("  Failure: {}", reason);
    }
    println!();

    if !state.trail.is_empty() {
        let names: Vec<&str> = state.trail.iter().map(|c| c.name.as_str()).collect();
        println!("Trail: {}", names.join(" > "));
        println!();
    }

    println!("Nodes:");
    println!("  Processed: {}", state.statistics.processed);
    println!("  Failed: {}", state.statistics.failed);
    println!("  Children discovered: {}", state.statistics.discovered);
    if let Some(in_flight) = &state.current_processing {
        println!("  In flight: {} (since {})", in_flight.url, in_flight.since.to_rfc3339());
    }
    println!();

    if !state.failed_urls.is_empty() {
        println!("Failed URLs ({}):", state.failed_urls.len());
        for url in &state.failed_urls {
            match state.failure_reasons.get(url) {
                Some(reason) => println!("  - {} ({})", url, reason),
                None => println!("  - {}", url),
            }
        }
        println!();
    }

    if let Some(tree) = &state.partial_tree {
        print_tree_statistics(&TreeStatistics::from_tree(tree));
    }
}
