//! File-backed checkpoint store
//!
//! One JSON record per target, named by the SHA-256 of the target URL.
//! Every mutating operation rewrites the whole record through a temporary
//! file and a rename, so a crash mid-write leaves the previous record intact.

use crate::state::{CrawlState, InFlight, SessionStatus, STATE_VERSION};
use crate::tree::TreeNode;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while persisting a checkpoint
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to write checkpoint {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to back up checkpoint {path}: {source}")]
    Backup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode checkpoint: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for checkpoint operations
pub type StateResult<T> = Result<T, StateError>;

/// Reads and writes [`CrawlState`] records in a directory
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the record for `target`; stable across runs
    pub fn state_path(&self, target: &str) -> PathBuf {
        let digest = Sha256::digest(target.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Loads the record for `target`, or a fresh one
    ///
    /// A missing, unreadable, unparseable, outdated or mismatched record all
    /// yield a fresh `NotStarted` state.
    pub fn load(&self, target: &str) -> CrawlState {
        let path = self.state_path(target);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No checkpoint at {}", path.display());
                return CrawlState::new(target);
            }
            Err(e) => {
                warn!("Unreadable checkpoint {}: {}; starting fresh", path.display(), e);
                return CrawlState::new(target);
            }
        };

        match serde_json::from_str::<CrawlState>(&raw) {
            Ok(state) if state.version != STATE_VERSION => {
                warn!(
                    "Checkpoint {} has version {} (expected {}); starting fresh",
                    path.display(),
                    state.version,
                    STATE_VERSION
                );
                CrawlState::new(target)
            }
            Ok(state) if state.target != target => {
                warn!(
                    "Checkpoint {} belongs to {}; starting fresh",
                    path.display(),
                    state.target
                );
                CrawlState::new(target)
            }
            Ok(state) => state,
            Err(e) => {
                warn!("Corrupt checkpoint {}: {}; starting fresh", path.display(), e);
                CrawlState::new(target)
            }
        }
    }

    /// Moves the session to InProgress; the start time is recorded only once
    pub fn start_session(&self, state: &mut CrawlState) -> StateResult<()> {
        state.status = SessionStatus::InProgress;
        state.started_at.get_or_insert_with(Utc::now);
        state.finished_at = None;
        state.failure_reason = None;
        self.persist(state)
    }

    /// Records `url` as the single in-flight item
    pub fn mark_processing(
        &self,
        state: &mut CrawlState,
        url: &str,
        ancestors: &[String],
    ) -> StateResult<()> {
        state.current_processing = Some(InFlight {
            url: url.to_string(),
            ancestors: ancestors.to_vec(),
            since: Utc::now(),
        });
        self.persist(state)
    }

    /// Records that `url`'s own work finished with `child_count` children
    pub fn mark_completed(
        &self,
        state: &mut CrawlState,
        url: &str,
        child_count: usize,
    ) -> StateResult<()> {
        state.failed_urls.remove(url);
        state.failure_reasons.remove(url);
        if state.processed_urls.insert(url.to_string()) {
            state.statistics.processed += 1;
            state.statistics.discovered += child_count as u64;
        }
        clear_in_flight(state, url);
        self.persist(state)
    }

    /// Records that `url`'s own work ended in error
    pub fn mark_failed(&self, state: &mut CrawlState, url: &str, reason: &str) -> StateResult<()> {
        if state.is_processed(url) {
            warn!("Ignoring failure of already completed {}: {}", url, reason);
        } else {
            if state.failed_urls.insert(url.to_string()) {
                state.statistics.failed += 1;
            }
            state
                .failure_reasons
                .insert(url.to_string(), reason.to_string());
        }
        clear_in_flight(state, url);
        self.persist(state)
    }

    /// Snapshots the partial tree and persists
    pub fn save_tree(&self, state: &mut CrawlState, tree: &TreeNode) -> StateResult<()> {
        state.set_tree(tree);
        self.persist(state)
    }

    /// Returns the last snapshotted tree
    pub fn get_tree<'a>(&self, state: &'a CrawlState) -> Option<&'a TreeNode> {
        state.partial_tree.as_ref()
    }

    pub fn complete_session(&self, state: &mut CrawlState) -> StateResult<()> {
        state.status = SessionStatus::Completed;
        state.current_processing = None;
        state.finished_at = Some(Utc::now());
        self.persist(state)
    }

    pub fn fail_session(&self, state: &mut CrawlState, reason: &str) -> StateResult<()> {
        state.status = SessionStatus::Failed;
        state.failure_reason = Some(reason.to_string());
        state.finished_at = Some(Utc::now());
        self.persist(state)
    }

    /// Permits a future retry of `url`; returns false if it was not failed
    pub fn clear_failed(&self, state: &mut CrawlState, url: &str) -> StateResult<bool> {
        if !state.failed_urls.remove(url) {
            return Ok(false);
        }
        state.failure_reasons.remove(url);
        state.statistics.failed = state.statistics.failed.saturating_sub(1);
        self.persist(state)?;
        Ok(true)
    }

    /// Clears every failure; returns how many were cleared
    pub fn clear_all_failed(&self, state: &mut CrawlState) -> StateResult<usize> {
        let cleared = state.failed_urls.len();
        if cleared == 0 {
            return Ok(0);
        }
        state.failed_urls.clear();
        state.failure_reasons.clear();
        state.statistics.failed = 0;
        self.persist(state)?;
        Ok(cleared)
    }

    /// Discards the record for `target`, keeping a timestamped backup
    ///
    /// Returns the backup path, or `None` if there was nothing to discard.
    pub fn reset(&self, target: &str) -> StateResult<Option<PathBuf>> {
        let path = self.state_path(target);
        if !path.exists() {
            return Ok(None);
        }

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let backup = PathBuf::from(format!("{}.{}.bak", path.display(), stamp));
        fs::rename(&path, &backup).map_err(|source| StateError::Backup {
            path: path.clone(),
            source,
        })?;

        Ok(Some(backup))
    }

    /// Writes the full record atomically
    pub fn persist(&self, state: &mut CrawlState) -> StateResult<()> {
        state.updated_at = Some(Utc::now());
        let encoded = serde_json::to_vec_pretty(state)?;
        let path = self.state_path(&state.target);
        write_atomic(&path, &encoded)
    }
}

fn clear_in_flight(state: &mut CrawlState, url: &str) {
    if state
        .current_processing
        .as_ref()
        .is_some_and(|f| f.url == url)
    {
        state.current_processing = None;
    }
}

/// Writes `bytes` to a sibling temporary file, then renames it over `path`
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> StateResult<()> {
    let io_err = |source| StateError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, bytes).map_err(io_err)?;
    fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}
