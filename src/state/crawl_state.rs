/// Checkpoint record definitions
///
/// A [`CrawlState`] is the durable record of one harvesting session, keyed
/// by the session's target URL.
use crate::tree::{Crumb, TreeNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Version of the persisted record layout
pub const STATE_VERSION: u32 = 1;

/// Session-level lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Returns true if the session ended (successfully or not)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-URL lifecycle: `Unvisited -> Processing -> {Completed, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlStatus {
    Unvisited,
    Processing,
    Completed,
    Failed,
}

impl UrlStatus {
    /// Completed and Failed URLs are not worked again in this session
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Progress counters, for reporting only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStatistics {
    pub discovered: u64,
    pub processed: u64,
    pub failed: u64,
}

/// The single URL currently being worked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InFlight {
    pub url: String,
    /// URLs from the root down to the parent of `url`
    pub ancestors: Vec<String>,
    pub since: DateTime<Utc>,
}

/// Durable checkpoint of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlState {
    pub version: u32,

    /// The URL the session was launched for
    pub target: String,

    pub status: SessionStatus,

    /// Resolved root-to-target trail; empty until resolved
    #[serde(default)]
    pub trail: Vec<Crumb>,

    #[serde(default)]
    pub processed_urls: BTreeSet<String>,

    #[serde(default)]
    pub failed_urls: BTreeSet<String>,

    /// Last failure reason per failed URL
    #[serde(default)]
    pub failure_reasons: BTreeMap<String, String>,

    #[serde(default)]
    pub current_processing: Option<InFlight>,

    #[serde(default)]
    pub partial_tree: Option<TreeNode>,

    #[serde(default)]
    pub statistics: CrawlStatistics,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,

    /// Why the session failed, if it did
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl CrawlState {
    /// Creates a fresh, not-yet-started record for `target`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            version: STATE_VERSION,
            target: target.into(),
            status: SessionStatus::NotStarted,
            trail: Vec::new(),
            processed_urls: BTreeSet::new(),
            failed_urls: BTreeSet::new(),
            failure_reasons: BTreeMap::new(),
            current_processing: None,
            partial_tree: None,
            statistics: CrawlStatistics::default(),
            started_at: None,
            updated_at: None,
            finished_at: None,
            failure_reason: None,
        }
    }

    pub fn is_processed(&self, url: &str) -> bool {
        self.processed_urls.contains(url)
    }

    pub fn is_failed(&self, url: &str) -> bool {
        self.failed_urls.contains(url)
    }

    /// Where `url` stands in its own lifecycle
    pub fn url_status(&self, url: &str) -> UrlStatus {
        if self.is_processed(url) {
            UrlStatus::Completed
        } else if self.is_failed(url) {
            UrlStatus::Failed
        } else if self
            .current_processing
            .as_ref()
            .is_some_and(|f| f.url == url)
        {
            UrlStatus::Processing
        } else {
            UrlStatus::Unvisited
        }
    }

    /// Replaces the in-memory tree snapshot without persisting
    pub fn set_tree(&mut self, tree: &TreeNode) {
        self.partial_tree = Some(tree.clone());
    }

    /// Returns true if the record holds any progress worth resuming
    pub fn has_progress(&self) -> bool {
        !self.processed_urls.is_empty()
            || !self.failed_urls.is_empty()
            || self.partial_tree.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = CrawlState::new("https://example.com/Device/Phone");
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.status, SessionStatus::NotStarted);
        assert!(!state.has_progress());
        assert!(state.started_at.is_none());
    }

    #[test]
    fn test_url_status() {
        let mut state = CrawlState::new("u:t");
        state.processed_urls.insert("u:a".to_string());
        state.failed_urls.insert("u:b".to_string());
        state.current_processing = Some(InFlight {
            url: "u:c".to_string(),
            ancestors: vec!["u:t".to_string()],
            since: Utc::now(),
        });

        assert_eq!(state.url_status("u:a"), UrlStatus::Completed);
        assert_eq!(state.url_status("u:b"), UrlStatus::Failed);
        assert_eq!(state.url_status("u:c"), UrlStatus::Processing);
        assert_eq!(state.url_status("u:d"), UrlStatus::Unvisited);
        assert!(UrlStatus::Failed.is_terminal());
        assert!(!UrlStatus::Processing.is_terminal());
    }

    #[test]
    fn test_session_status() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
        assert_eq!(SessionStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_record_field_names() {
        let mut state = CrawlState::new("u:t");
        state.set_tree(&TreeNode::new("Root", "u:root"));

        let json = serde_json::to_value(&state).unwrap();
        for field in [
            "version",
            "target",
            "status",
            "partialTree",
            "processedUrls",
            "failedUrls",
            "currentProcessing",
            "statistics",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(json["status"], "not_started");
    }
}
