//! Content consolidation
//!
//! Turns the raw text fragments gathered from a page into a single clean,
//! deduplicated block:
//!
//! 1. Each fragment is split into sentences (blank lines mark block edges).
//! 2. A fragment containing a boilerplate sentence is discarded whole.
//! 3. Sentences that duplicate accepted text (token Jaccard above
//!    `sentence-similarity`, or word-level containment either way) are
//!    dropped; if the share of such duplicates exceeds
//!    `fragment-redundancy`, the whole fragment is dropped.
//! 4. Surviving sentences are grouped into paragraphs and near-identical
//!    paragraphs are collapsed to their first occurrence.
//!
//! Output paragraphs are separated by a blank line, which the splitter
//! reads back as block edges, so consolidating the output again returns
//! it unchanged.

mod boilerplate;
mod sentence;

pub use boilerplate::{BoilerplateFilter, PatternBoilerplate};
pub use sentence::{jaccard, normalize, split_blocks, split_sentences, Sentence};

use crate::config::ConsolidationConfig;
use crate::ConfigError;
use std::collections::BTreeSet;
use tracing::debug;

/// A sentence that made it through deduplication
#[derive(Debug)]
struct Accepted {
    sentence: Sentence,
    /// Starts an input block (fragment or blank-line separated run)
    boundary: bool,
}

/// Cleans, deduplicates and paragraphs raw text fragments
pub struct Consolidator {
    config: ConsolidationConfig,
    filter: Box<dyn BoilerplateFilter>,
}

impl Consolidator {
    /// Creates a consolidator using the configured boilerplate patterns
    pub fn from_config(config: &ConsolidationConfig) -> Result<Self, ConfigError> {
        let filter = PatternBoilerplate::new(&config.boilerplate_patterns)?;
        Ok(Self::with_filter(config.clone(), filter))
    }

    /// Creates a consolidator with a custom boilerplate filter
    pub fn with_filter(
        config: ConsolidationConfig,
        filter: impl BoilerplateFilter + 'static,
    ) -> Self {
        Self {
            config,
            filter: Box::new(filter),
        }
    }

    /// Consolidates fragments in order; earlier text wins over later repeats
    ///
    /// Returns an empty string when nothing survives.
    pub fn consolidate<S: AsRef<str>>(&self, fragments: &[S]) -> String {
        let mut accepted: Vec<Accepted> = Vec::new();

        for (index, fragment) in fragments.iter().enumerate() {
            let sentences = fragment_sentences(fragment.as_ref());
            if sentences.is_empty() {
                continue;
            }

            if sentences
                .iter()
                .any(|(s, _)| self.filter.is_boilerplate(&s.text))
            {
                debug!("Fragment {} discarded as boilerplate", index);
                continue;
            }

            let total = sentences.len();
            let mut kept: Vec<Accepted> = Vec::new();
            let mut repeated = 0;
            let mut boundary = false;

            for (sentence, starts_block) in sentences {
                boundary |= starts_block;

                if accepted
                    .iter()
                    .any(|a| self.is_duplicate(&sentence, &a.sentence))
                {
                    repeated += 1;
                    continue;
                }
                if kept.iter().any(|k| self.is_duplicate(&sentence, &k.sentence)) {
                    continue;
                }

                kept.push(Accepted { sentence, boundary });
                boundary = false;
            }

            let redundancy = repeated as f64 / total as f64;
            if redundancy > self.config.fragment_redundancy {
                debug!(
                    "Fragment {} discarded: {:.0}% already covered",
                    index,
                    redundancy * 100.0
                );
                continue;
            }

            accepted.extend(kept);
        }

        let paragraphs = self.collapse_paragraphs(self.paragraphs(accepted));

        paragraphs
            .iter()
            .map(|p| {
                p.iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn is_duplicate(&self, candidate: &Sentence, existing: &Sentence) -> bool {
        candidate.overlaps(existing)
            || candidate.similarity(existing) > self.config.sentence_similarity
    }

    /// Groups sentences into paragraphs
    ///
    /// A paragraph ends when it reaches the maximum size, or once it has the
    /// minimum size and the next sentence starts a block or shares no
    /// keyword with the previous one.
    fn paragraphs(&self, sentences: Vec<Accepted>) -> Vec<Vec<Sentence>> {
        let min = self.config.min_paragraph_sentences;
        let max = self.config.max_paragraph_sentences;

        let mut paragraphs = Vec::new();
        let mut current: Vec<Sentence> = Vec::new();

        for Accepted { sentence, boundary } in sentences {
            if let Some(previous) = current.last() {
                let size = current.len();
                let natural_break = boundary || sentence.shifts_topic_from(previous);
                if size >= max || (size >= min && natural_break) {
                    paragraphs.push(std::mem::take(&mut current));
                }
            }
            current.push(sentence);
        }
        if !current.is_empty() {
            paragraphs.push(current);
        }

        paragraphs
    }

    /// Drops paragraphs too similar to an earlier kept one
    fn collapse_paragraphs(&self, paragraphs: Vec<Vec<Sentence>>) -> Vec<Vec<Sentence>> {
        let mut kept: Vec<(Vec<Sentence>, BTreeSet<String>)> = Vec::new();

        for paragraph in paragraphs {
            let tokens: BTreeSet<String> = paragraph
                .iter()
                .flat_map(|s| s.tokens.iter().cloned())
                .collect();

            let similar = kept
                .iter()
                .any(|(_, other)| jaccard(&tokens, other) > self.config.paragraph_similarity);
            if similar {
                debug!("Collapsed a repeated paragraph");
                continue;
            }

            kept.push((paragraph, tokens));
        }

        kept.into_iter().map(|(p, _)| p).collect()
    }
}

/// Splits a fragment into sentences, flagging those that open a block
fn fragment_sentences(fragment: &str) -> Vec<(Sentence, bool)> {
    let mut sentences = Vec::new();

    for block in split_blocks(fragment) {
        let mut first = true;
        for text in split_sentences(&block) {
            if let Some(sentence) = Sentence::new(text) {
                sentences.push((sentence, first));
                first = false;
            }
        }
    }

    sentences
}
