//! Finished artifacts waiting to be collected.
//!
//! Final clip files are handed over once: [`ArtifactRegistry::take`] removes
//! the entry and the caller becomes responsible for the file. Entries nobody
//! collects are deleted after the retention period.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::RunId;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub file_name: String,
}

#[derive(Debug)]
struct Entry {
    artifact: StoredArtifact,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct ArtifactRegistry {
    entries: Mutex<HashMap<RunId, Entry>>,
    ttl: Duration,
}

impl ArtifactRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn insert(&self, run_id: RunId, artifact: StoredArtifact) {
        self.entries.lock().insert(
            run_id,
            Entry {
                artifact,
                stored_at: Instant::now(),
            },
        );
    }

    /// Remove and return the artifact; a second call for the same id yields `None`
    pub fn take(&self, run_id: &RunId) -> Option<StoredArtifact> {
        self.entries.lock().remove(run_id).map(|e| e.artifact)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Drop expired entries and delete their files
    pub async fn sweep_expired(&self) -> usize {
        let expired: Vec<StoredArtifact> = {
            let mut entries = self.entries.lock();
            let ttl = self.ttl;
            let ids: Vec<RunId> = entries
                .iter()
                .filter(|(_, e)| e.stored_at.elapsed() >= ttl)
                .map(|(id, _)| *id)
                .collect();
            ids.iter()
                .filter_map(|id| entries.remove(id).map(|e| e.artifact))
                .collect()
        };

        for artifact in &expired {
            remove_artifact(&artifact.path, "expired").await;
        }
        expired.len()
    }

    /// Delete every remaining file; used on shutdown
    pub async fn purge(&self) -> usize {
        let all: Vec<StoredArtifact> = self.entries.lock().drain().map(|(_, e)| e.artifact).collect();
        for artifact in &all {
            remove_artifact(&artifact.path, "uncollected").await;
        }
        all.len()
    }

    /// Periodic expiry until `shutdown` fires
    pub fn spawn_sweeper(self: Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        let period = (self.ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = self.sweep_expired().await;
                        if removed > 0 {
                            info!(removed, pending = self.len(), "expired artifacts removed");
                        }
                    }
                }
            }
        })
    }
}

/// Delete an artifact file; failures are logged as `cleanup_failed`
async fn remove_artifact(path: &Path, why: &str) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "{} artifact removed", why),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            let err = DomainError::CleanupFailed(format!("{}: {}", path.display(), e));
            warn!(kind = err.kind(), "{}", err);
        }
    }
}
