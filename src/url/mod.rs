//! URL handling module for Canopy
//!
//! This module provides URL normalization (node identity), conversions
//! between labels and path segments, and link denylist matching.

mod matcher;
mod normalize;
mod slug;

// Re-export main functions
pub use matcher::is_denied_link;
pub use normalize::{canonical, normalize_url};
pub use slug::{
    fallback_url, join_segments, keyword_tokens, label_from_segment, last_segment,
    segments_below, slugify,
};
