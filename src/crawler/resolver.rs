//! Path Resolver: reconstructs the root-to-target breadcrumb trail
//!
//! Strategies, first success wins:
//!
//! 1. The target's own breadcrumb, walked from the root with each label
//!    matched against the current page's child links (synthesized slug URL
//!    when nothing matches).
//! 2. The target URL's path segments below the category base.
//! 3. A bounded depth-first search from the root, following links that
//!    share keywords with the target first.
//! 4. `[root, target]`.

use crate::config::ResolverConfig;
use crate::crawler::{ChildLink, FieldExtractor, PageFetcher, PageSignals};
use crate::tree::Crumb;
use crate::url::{
    canonical, fallback_url, join_segments, keyword_tokens, label_from_segment, last_segment,
    segments_below,
};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Resolves breadcrumb trails using a fetcher and an extractor
pub struct PathResolver<'a, F, E> {
    fetcher: &'a F,
    extractor: &'a E,
    config: &'a ResolverConfig,
}

impl<'a, F: PageFetcher, E: FieldExtractor> PathResolver<'a, F, E> {
    pub fn new(fetcher: &'a F, extractor: &'a E, config: &'a ResolverConfig) -> Self {
        Self {
            fetcher,
            extractor,
            config,
        }
    }

    /// Returns the trail from the root to `target`
    ///
    /// Never empty and never fails; the last crumb's URL is the canonical
    /// target URL.
    pub async fn resolve(&self, target: &str) -> Vec<Crumb> {
        let target = canonical(target);
        let root = self.root_crumb();

        if target == root.url {
            return vec![root];
        }

        let signals = self.signals(&target).await;

        if let Some(signals) = &signals {
            if signals.breadcrumb.len() > 1 {
                info!(
                    "Resolving {} from breadcrumb: {}",
                    target,
                    signals.breadcrumb.join(" > ")
                );
                return self.walk_breadcrumb(&signals.breadcrumb, &target).await;
            }
        }

        if let Some(trail) = self.from_segments(&target) {
            info!("Resolved {} from its URL path", target);
            return trail;
        }

        if let Some(trail) = self.search(&target).await {
            info!("Resolved {} by searching from the root", target);
            return trail;
        }

        warn!("Could not place {} below the root; attaching directly", target);
        let name = signals
            .and_then(|s| s.title)
            .unwrap_or_else(|| self.label_for(&target));
        vec![root, Crumb::new(name, target)]
    }

    fn root_crumb(&self) -> Crumb {
        Crumb::new(
            self.config.root_name.clone(),
            canonical(&self.config.root_url),
        )
    }

    async fn signals(&self, url: &str) -> Option<PageSignals> {
        match self.fetcher.fetch(url).await {
            Ok(doc) => Some(self.extractor.classify(&doc)),
            Err(e) => {
                debug!("Resolver could not fetch {}: {}", url, e);
                None
            }
        }
    }

    /// Walks breadcrumb labels from the root, matching each against the
    /// child links of the page resolved for the previous label
    async fn walk_breadcrumb(&self, labels: &[String], target: &str) -> Vec<Crumb> {
        let root = self.root_crumb();
        let mut seen: HashSet<String> = HashSet::from([root.url.clone(), target.to_string()]);
        let mut trail = vec![Crumb::new(labels[0].clone(), root.url)];

        for label in &labels[1..labels.len() - 1] {
            let current = trail[trail.len() - 1].url.clone();

            let matched = match self.signals(&current).await {
                Some(signals) => self
                    .best_match(label, &signals.children)
                    .map(|c| canonical(&c.url)),
                None => None,
            };

            let url = match matched {
                Some(url) => url,
                None => {
                    let base = self.config.category_base();
                    match fallback_url(base, label, self.config.join_char) {
                        Ok(url) => {
                            warn!("No link for '{}' on {}; using {}", label, current, url);
                            url
                        }
                        Err(e) => {
                            warn!("Skipping breadcrumb label '{}': {}", label, e);
                            continue;
                        }
                    }
                }
            };

            if !seen.insert(url.clone()) {
                debug!("Breadcrumb label '{}' repeats {}; skipped", label, url);
                continue;
            }
            trail.push(Crumb::new(label.clone(), url));
        }

        trail.push(Crumb::new(labels[labels.len() - 1].clone(), target));
        trail
    }

    /// Picks the child link best matching `label`
    ///
    /// Labels are compared case-folded with generic suffix words removed:
    /// exact match first, then containment either way, then the alias table.
    pub fn best_match<'c>(
        &self,
        label: &str,
        candidates: &'c [ChildLink],
    ) -> Option<&'c ChildLink> {
        let wanted = self.match_key(label);
        if wanted.is_empty() {
            return None;
        }

        let keyed: Vec<(String, &ChildLink)> = candidates
            .iter()
            .map(|c| (self.match_key(&c.name), c))
            .filter(|(key, _)| !key.is_empty())
            .collect();

        if let Some((_, c)) = keyed.iter().find(|(key, _)| *key == wanted) {
            return Some(*c);
        }

        if let Some((_, c)) = keyed
            .iter()
            .find(|(key, _)| key.contains(&wanted) || wanted.contains(key.as_str()))
        {
            return Some(*c);
        }

        let synonyms = self.synonyms(&wanted);
        keyed
            .iter()
            .find(|(key, _)| synonyms.contains(key))
            .map(|(_, c)| *c)
    }

    /// Case-folded label with trailing generic qualifier words removed
    fn match_key(&self, label: &str) -> String {
        let mut words: Vec<String> = label
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();

        while words.len() > 1
            && words.last().is_some_and(|last| {
                self.config
                    .generic_suffixes
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(last))
            })
        {
            words.pop();
        }

        words.join(" ")
    }

    /// All alias-table keys equivalent to `key`, excluding itself
    fn synonyms(&self, key: &str) -> BTreeSet<String> {
        let mut synonyms = BTreeSet::new();

        for (name, aliases) in &self.config.aliases {
            let group: Vec<String> = std::iter::once(name)
                .chain(aliases.iter())
                .map(|l| self.match_key(l))
                .collect();
            if group.iter().any(|g| g == key) {
                synonyms.extend(group.into_iter().filter(|g| g != key));
            }
        }

        synonyms
    }

    /// Rebuilds the trail from the target's path segments below the category base
    ///
    /// Only URLs strictly below the root are kept, each at most once, so a
    /// base above the root cannot repeat the root inside the chain.
    fn from_segments(&self, target: &str) -> Option<Vec<Crumb>> {
        let base = self.config.category_base();
        let segments = segments_below(base, target)?;
        if segments.is_empty() {
            return None;
        }

        let root = self.root_crumb();
        let mut seen: HashSet<String> = HashSet::from([root.url.clone()]);
        let mut crumbs = Vec::with_capacity(segments.len() + 1);

        let base_url = canonical(base);
        crumbs.push(Crumb::new(self.label_for(&base_url), base_url));
        for depth in 1..=segments.len() {
            let url = if depth == segments.len() {
                target.to_string()
            } else {
                join_segments(base, &segments[..depth])?
            };
            let name = label_from_segment(&segments[depth - 1], self.config.join_char);
            crumbs.push(Crumb::new(name, url));
        }

        let mut trail = vec![root.clone()];
        for crumb in crumbs {
            let below_root = segments_below(&root.url, &crumb.url).is_some_and(|s| !s.is_empty());
            if !below_root || !seen.insert(crumb.url.clone()) {
                debug!("Segment crumb {} is not below the root; skipped", crumb.url);
                continue;
            }
            trail.push(crumb);
        }

        if trail.last().map(|c| c.url.as_str()) != Some(target) {
            return None;
        }
        Some(trail)
    }

    /// Depth-first search from the root for a page linking to `target`
    ///
    /// Links sharing keywords with the target's last segment are explored
    /// first. Bounded by `search-depth` levels and `search-budget` fetches.
    async fn search(&self, target: &str) -> Option<Vec<Crumb>> {
        let keywords: BTreeSet<String> = keyword_tokens(&self.label_for(target))
            .into_iter()
            .collect();

        let root = self.root_crumb();
        let mut visited: HashSet<String> = HashSet::from([root.url.clone()]);
        let mut stack: Vec<Vec<Crumb>> = vec![vec![root]];
        let mut budget = self.config.search_budget;

        while let Some(path) = stack.pop() {
            if budget == 0 {
                debug!("Search budget exhausted looking for {}", target);
                break;
            }
            budget -= 1;

            let current = &path[path.len() - 1];
            let Some(signals) = self.signals(&current.url).await else {
                continue;
            };

            if let Some(hit) = signals
                .children
                .iter()
                .find(|c| canonical(&c.url) == target)
            {
                let mut trail = path.clone();
                trail.push(Crumb::new(hit.name.clone(), target));
                return Some(trail);
            }

            if path.len() >= self.config.search_depth as usize {
                continue;
            }

            let (matching, other): (Vec<&ChildLink>, Vec<&ChildLink>) = signals
                .children
                .iter()
                .partition(|c| shares_keyword(&keywords, c));

            // Pushed in reverse so keyword matches are popped first
            for child in matching.into_iter().chain(other).rev() {
                let url = canonical(&child.url);
                if visited.insert(url.clone()) {
                    let mut next = path.clone();
                    next.push(Crumb::new(child.name.clone(), url));
                    stack.push(next);
                }
            }
        }

        None
    }

    fn label_for(&self, url: &str) -> String {
        last_segment(url)
            .map(|s| label_from_segment(&s, self.config.join_char))
            .unwrap_or_else(|| url.to_string())
    }
}

fn shares_keyword(keywords: &BTreeSet<String>, link: &ChildLink) -> bool {
    let from_url = last_segment(&link.url).unwrap_or_default();
    keyword_tokens(&link.name)
        .into_iter()
        .chain(keyword_tokens(&from_url))
        .any(|t| keywords.contains(&t))
}
