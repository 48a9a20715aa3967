//! Sentence splitting, normalization and similarity

use std::collections::BTreeSet;

/// Characters that may trail sentence-ending punctuation
const CLOSERS: &[char] = &['"', '\'', ')', ']', '}', '»', '”', '’'];

/// Sentence-ending punctuation
const TERMINALS: &[char] = &['.', '!', '?', '…'];

/// A sentence with its comparison forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Display text: original casing, single spaces, terminal punctuation
    pub text: String,
    /// Lowercase, punctuation-free, single-spaced
    pub norm: String,
    pub tokens: BTreeSet<String>,
}

impl Sentence {
    /// Builds a sentence from display text; `None` if nothing comparable remains
    pub fn new(text: String) -> Option<Self> {
        let norm = normalize(&text);
        if norm.is_empty() {
            return None;
        }
        let tokens = norm.split(' ').map(str::to_string).collect();
        Some(Self { text, norm, tokens })
    }

    /// Jaccard similarity of the two token sets
    pub fn similarity(&self, other: &Sentence) -> f64 {
        jaccard(&self.tokens, &other.tokens)
    }

    /// True if either sentence's words appear as a contiguous run in the other
    pub fn overlaps(&self, other: &Sentence) -> bool {
        contains_phrase(&self.norm, &other.norm) || contains_phrase(&other.norm, &self.norm)
    }

    /// True if the sentences share no token longer than three characters
    pub fn shifts_topic_from(&self, other: &Sentence) -> bool {
        !self
            .tokens
            .iter()
            .filter(|t| t.chars().count() > 3)
            .any(|t| other.tokens.contains(t))
    }
}

/// Splits text into blocks separated by blank lines
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks
}

/// Splits text into display sentences
///
/// A sentence ends at a word whose last character (ignoring closing quotes
/// and brackets) is terminal punctuation. Whitespace is collapsed, and a
/// sentence without terminal punctuation gains a period, so joining the
/// results with whitespace and splitting again yields the same sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        if ends_sentence(word) {
            sentences.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        let mut tail = current.join(" ");
        tail.push('.');
        sentences.push(tail);
    }

    sentences
}

fn ends_sentence(word: &str) -> bool {
    word.trim_end_matches(CLOSERS)
        .chars()
        .last()
        .is_some_and(|c| TERMINALS.contains(&c))
}

/// Lowercases, replaces punctuation with spaces, and collapses whitespace
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().collect::<String>()
            } else {
                " ".to_string()
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Token-set Jaccard similarity
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Word-boundary containment of `needle` in `haystack` (both normalized)
fn contains_phrase(haystack: &str, needle: &str) -> bool {
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}
