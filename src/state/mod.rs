//! Crawl State Store
//!
//! Durable, per-target checkpoint of a harvesting session.
//!
//! # Components
//!
//! - `CrawlState`: processed/failed URL sets, in-flight marker, partial tree, counters
//! - `StateStore`: loads and atomically persists `CrawlState` records as JSON

mod crawl_state;
mod store;

pub use crawl_state::{
    CrawlState, CrawlStatistics, InFlight, SessionStatus, UrlStatus, STATE_VERSION,
};
pub(crate) use store::write_atomic;
pub use store::{StateError, StateResult, StateStore};
