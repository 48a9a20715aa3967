//! Crawl Orchestrator - depth-first harvesting with checkpoint/resume
//!
//! This module drives a whole session:
//! - Loading (or starting) the checkpoint for the target
//! - Resolving the root-to-target trail once and building the node chain
//! - Expanding the chain's last node depth-first with an explicit stack
//! - Persisting after every node transition
//! - Containing per-node failures so siblings and ancestors carry on
//!
//! Completion is recorded as soon as a node's own work (fetch, children
//! list, content) is final, before its children are visited. A node found
//! Completed on resume gets its stored children spliced back in and is
//! still descended into; a Failed node is skipped until its failure is
//! cleared.

use crate::config::{Config, CrawlerConfig, ResolverConfig};
use crate::consolidate::Consolidator;
use crate::crawler::{ChildLink, FieldExtractor, PageFetcher, PageSignals, PathResolver};
use crate::state::{CrawlState, SessionStatus, StateStore, UrlStatus};
use crate::tree::{attachment_path, build_chain, ContentSection, Crumb, NodeContent, TreeNode};
use crate::url::{canonical, is_denied_link};
use crate::{CanopyError, ConfigError, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

/// Per-session mutable state, threaded through the traversal
pub struct CrawlContext<'a> {
    store: &'a StateStore,
    state: CrawlState,
    /// URLs claimed by a node in this run; never appended or expanded twice
    visited: HashSet<String>,
    nodes_worked: u64,
    started: Instant,
}

impl<'a> CrawlContext<'a> {
    pub fn new(store: &'a StateStore, state: CrawlState) -> Self {
        Self {
            store,
            state,
            visited: HashSet::new(),
            nodes_worked: 0,
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn into_state(self) -> CrawlState {
        self.state
    }

    /// Claims `url` for this run; false if it was already claimed
    pub fn claim(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    fn mark_processing(&mut self, url: &str, ancestors: &[String]) -> Result<()> {
        self.store.mark_processing(&mut self.state, url, ancestors)?;
        Ok(())
    }

    fn mark_completed(&mut self, root: &TreeNode, url: &str, child_count: usize) -> Result<()> {
        self.state.set_tree(root);
        self.store.mark_completed(&mut self.state, url, child_count)?;
        Ok(())
    }

    fn mark_failed(&mut self, root: &TreeNode, url: &str, reason: &str) -> Result<()> {
        self.state.set_tree(root);
        self.store.mark_failed(&mut self.state, url, reason)?;
        Ok(())
    }

    fn record_progress(&mut self, interval: u64) {
        self.nodes_worked += 1;
        if interval == 0 || self.nodes_worked % interval != 0 {
            return;
        }

        let stats = &self.state.statistics;
        let rate = self.nodes_worked as f64 / self.started.elapsed().as_secs_f64().max(0.001);
        tracing::info!(
            "Progress: {} processed, {} failed, {} discovered, {:.2} nodes/sec",
            stats.processed,
            stats.failed,
            stats.discovered,
            rate
        );
    }
}

/// Result of one harvesting session
#[derive(Debug, Clone)]
pub struct Harvest {
    pub tree: TreeNode,
    pub state: CrawlState,
}

impl Harvest {
    pub fn is_complete(&self) -> bool {
        self.state.status == SessionStatus::Completed
    }
}

/// What a single node's own work produced
#[derive(Debug)]
struct NodeOutcome {
    content: Option<NodeContent>,
    children: Vec<ChildLink>,
}

/// A pending expansion: child-index path from the root, depth below the
/// attachment point
#[derive(Debug)]
struct Frame {
    path: Vec<usize>,
    depth: u32,
}

/// Composes the fetcher, extractor, resolver and consolidator into a
/// resumable harvest
pub struct Harvester<F, E> {
    fetcher: F,
    extractor: E,
    consolidator: Consolidator,
    store: StateStore,
    crawler: CrawlerConfig,
    resolver: ResolverConfig,
    deny_patterns: Vec<String>,
}

impl<F: PageFetcher, E: FieldExtractor> Harvester<F, E> {
    /// Creates a harvester with checkpoints under `output.state-dir`
    pub fn new(
        config: &Config,
        fetcher: F,
        extractor: E,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            fetcher,
            extractor,
            consolidator: Consolidator::from_config(&config.consolidation)?,
            store: StateStore::new(PathBuf::from(&config.output.state_dir)),
            crawler: config.crawler.clone(),
            resolver: config.resolver.clone(),
            deny_patterns: config.links.deny_patterns.clone(),
        })
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Resolves the root-to-target trail without harvesting
    pub async fn resolve_trail(&self, target: &str) -> Vec<Crumb> {
        PathResolver::new(&self.fetcher, &self.extractor, &self.resolver)
            .resolve(target)
            .await
    }

    /// Runs (or resumes) the session for `target`
    ///
    /// Node failures are recorded and skipped. If the checkpoint cannot be
    /// persisted the session ends with status Failed and a reason; the tree
    /// built so far is still returned.
    pub async fn harvest(&self, target: &str) -> Harvest {
        let target = canonical(target);
        let mut ctx = CrawlContext::new(&self.store, self.store.load(&target));
        let mut root = TreeNode::new(
            self.resolver.root_name.clone(),
            canonical(&self.resolver.root_url),
        );

        if let Err(e) = self.run_session(&mut ctx, &mut root).await {
            let reason = e.to_string();
            tracing::error!("Session for {} failed: {}", target, reason);
            ctx.state.set_tree(&root);
            if let Err(persist_err) = self.store.fail_session(&mut ctx.state, &reason) {
                tracing::error!("Could not record session failure: {}", persist_err);
            }
        }

        Harvest {
            tree: root,
            state: ctx.into_state(),
        }
    }

    async fn run_session(&self, ctx: &mut CrawlContext<'_>, root: &mut TreeNode) -> Result<()> {
        let target = ctx.state.target.clone();

        if ctx.state.has_progress() {
            tracing::info!(
                "Resuming session for {} ({} processed, {} failed)",
                target,
                ctx.state.processed_urls.len(),
                ctx.state.failed_urls.len()
            );
        } else {
            tracing::info!("Starting session for {}", target);
        }
        self.store.start_session(&mut ctx.state)?;

        if ctx.state.trail.is_empty() {
            ctx.state.trail = self.resolve_trail(&target).await;
            self.store.persist(&mut ctx.state)?;
        }
        let trail = ctx.state.trail.clone();
        tracing::info!(
            "Trail: {}",
            trail
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(" > ")
        );

        let chain = build_chain(&trail)
            .ok_or_else(|| CanopyError::Session(format!("Empty trail for {}", target)))?;
        let start = attachment_path(&chain);
        *root = chain;

        if let Some(stored) = ctx.state.partial_tree.clone() {
            if stored.url == root.url {
                root.merge(stored);
            } else {
                tracing::warn!(
                    "Stored tree is rooted at {}, not {}; ignoring it",
                    stored.url,
                    root.url
                );
            }
        }

        // Links back up the chain must never be re-added below it
        for crumb in &trail {
            ctx.claim(&crumb.url);
        }

        self.traverse(ctx, root, start, &target).await?;

        ctx.state.set_tree(root);
        self.store.complete_session(&mut ctx.state)?;

        let stats = &ctx.state.statistics;
        tracing::info!(
            "Session completed: {} processed, {} failed, {} nodes in {:?}",
            stats.processed,
            stats.failed,
            root.count(),
            ctx.started.elapsed()
        );
        Ok(())
    }

    /// Expands the subtree at `start` depth-first
    async fn traverse(
        &self,
        ctx: &mut CrawlContext<'_>,
        root: &mut TreeNode,
        start: Vec<usize>,
        target: &str,
    ) -> Result<()> {
        let mut stack = vec![Frame {
            path: start,
            depth: 0,
        }];

        while let Some(Frame { path, depth }) = stack.pop() {
            let Some(url) = root.node_at(&path).map(|n| n.url.clone()) else {
                continue;
            };

            match ctx.state.url_status(&url) {
                UrlStatus::Failed => {
                    tracing::debug!("Skipping failed {}", url);
                    continue;
                }
                UrlStatus::Completed => {
                    self.splice(ctx, root, &path, &url);
                }
                status => {
                    if status == UrlStatus::Processing {
                        tracing::info!("Re-processing interrupted {}", url);
                    }

                    let ancestors = ancestor_urls(root, &path);
                    ctx.mark_processing(&url, &ancestors)?;

                    match self.process_node(&url, url == target).await {
                        Ok(outcome) => {
                            let child_count = match root.node_at_mut(&path) {
                                Some(node) => apply_outcome(ctx, node, outcome),
                                None => 0,
                            };
                            ctx.mark_completed(root, &url, child_count)?;
                            ctx.record_progress(self.crawler.progress_interval);
                        }
                        Err(e) if e.is_node_scoped() => {
                            tracing::warn!("Node {} failed: {}", url, e);
                            ctx.mark_failed(root, &url, &e.to_string())?;
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }

            let Some(node) = root.node_at(&path) else {
                continue;
            };

            // Reverse so the first-discovered child is expanded first
            for index in (0..node.children.len()).rev() {
                let child = &node.children[index];
                if !ctx.claim(&child.url) {
                    continue;
                }
                if depth >= self.crawler.max_depth {
                    tracing::debug!("Depth limit reached; not expanding {}", child.url);
                    continue;
                }

                let mut child_path = path.clone();
                child_path.push(index);
                stack.push(Frame {
                    path: child_path,
                    depth: depth + 1,
                });
            }
        }

        Ok(())
    }

    /// Restores the stored subtree of a completed node
    fn splice(&self, ctx: &CrawlContext<'_>, root: &mut TreeNode, path: &[usize], url: &str) {
        let stored = ctx
            .state
            .partial_tree
            .as_ref()
            .and_then(|tree| tree.find(url))
            .cloned();

        if let (Some(stored), Some(node)) = (stored, root.node_at_mut(path)) {
            let before = node.children.len();
            node.merge(stored);
            tracing::debug!(
                "Completed {}: {} children ({} spliced)",
                url,
                node.children.len(),
                node.children.len() - before
            );
        }
    }

    /// Fetches and classifies one page
    async fn process_node(&self, url: &str, is_target: bool) -> Result<NodeOutcome> {
        tracing::debug!("Processing {}", url);

        let doc = self.fetcher.fetch(url).await?;
        let signals = self.extractor.classify(&doc);
        let children = self.filter_candidates(url, &signals.children);

        let wants_content = signals.is_leaf
            || children.is_empty()
            || (is_target && self.crawler.treat_target_as_leaf);

        if children.is_empty() && !signals.is_leaf && !signals.has_fragments() {
            tracing::warn!("No children or content on {}; keeping it as an empty leaf", url);
        }

        Ok(NodeOutcome {
            content: wants_content.then(|| self.build_content(&signals)),
            children,
        })
    }

    /// Drops denied links, self-links and duplicates, then bounds fan-out
    fn filter_candidates(&self, parent: &str, links: &[ChildLink]) -> Vec<ChildLink> {
        let mut seen = HashSet::new();
        let mut kept: Vec<ChildLink> = links
            .iter()
            .filter_map(|link| {
                let url = canonical(&link.url);
                if url == parent || is_denied_link(&url, &self.deny_patterns) {
                    return None;
                }
                seen.insert(url.clone())
                    .then(|| ChildLink::new(link.name.clone(), url))
            })
            .collect();

        let max = self.crawler.max_fan_out as usize;
        if kept.len() > max {
            tracing::warn!(
                "{} lists {} children; following the first {}",
                parent,
                kept.len(),
                max
            );
            kept.truncate(max);
        }

        kept
    }

    fn build_content(&self, signals: &PageSignals) -> NodeContent {
        NodeContent {
            title: signals.title.clone(),
            sections: signals
                .sections
                .iter()
                .map(|section| ContentSection {
                    name: section.name.clone(),
                    text: self.consolidator.consolidate(&section.fragments),
                })
                .collect(),
        }
    }
}

/// Attaches content and new children to `node`; returns its child count
fn apply_outcome(ctx: &CrawlContext<'_>, node: &mut TreeNode, outcome: NodeOutcome) -> usize {
    if let Some(content) = outcome.content {
        node.content = Some(content);
    }

    for link in outcome.children {
        if ctx.is_visited(&link.url) || node.has_child(&link.url) {
            continue;
        }
        node.children.push(TreeNode::new(link.name, link.url));
    }

    node.children.len()
}

/// URLs from the root down to the parent of the node at `path`
fn ancestor_urls(root: &TreeNode, path: &[usize]) -> Vec<String> {
    (0..path.len())
        .filter_map(|depth| root.node_at(&path[..depth]).map(|n| n.url.clone()))
        .collect()
}
