//! Run-scoped scratch directories.
//!
//! Every intermediate of a run lives in `<temp_dir>/<run_id>/`. The directory
//! is removed by [`RunWorkspace::close`] on normal exits and by `Drop` when the
//! owning future is abandoned (client disconnect, shutdown). A published
//! output stays owned by the run until [`PublishedArtifact::release`] hands it
//! to the caller.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::errors::DomainError;
use crate::domain::model::{FinalArtifact, RunId};

#[derive(Debug)]
pub struct RunWorkspace {
    run_id: RunId,
    dir: TempDir,
}

impl RunWorkspace {
    /// Create `<parent>/<run_id>`; fails if it already exists
    pub fn create(parent: &Path, run_id: RunId) -> Result<Self, DomainError> {
        std::fs::create_dir_all(parent).map_err(|e| {
            DomainError::FsFail(format!("Failed to create {}: {}", parent.display(), e))
        })?;
        // absolute, so concat manifests never depend on the working directory
        let parent = std::fs::canonicalize(parent).map_err(|e| {
            DomainError::FsFail(format!("Failed to resolve {}: {}", parent.display(), e))
        })?;

        let dir = tempfile::Builder::new()
            .prefix(&run_id.to_string())
            .rand_bytes(0)
            .tempdir_in(&parent)
            .map_err(|e| {
                DomainError::FsFail(format!("Failed to create run directory for {}: {}", run_id, e))
            })?;
        debug!(run_id = %run_id, path = %dir.path().display(), "run workspace created");

        Ok(Self { run_id, dir })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `<dir>/<run_id>_<stem>.<extension>`
    pub fn file(&self, stem: &str, extension: &str) -> PathBuf {
        self.dir.path().join(self.run_id.file_name(stem, extension))
    }

    /// Remove the directory and everything in it
    pub async fn close(self) -> Result<(), DomainError> {
        let run_id = self.run_id;
        let path = self.dir.path().to_path_buf();
        let closed = tokio::task::spawn_blocking(move || self.dir.close())
            .await
            .map_err(|e| DomainError::CleanupFailed(format!("{}: {}", path.display(), e)))?;
        closed.map_err(|e| DomainError::CleanupFailed(format!("{}: {}", path.display(), e)))?;
        debug!(run_id = %run_id, "run workspace removed");
        Ok(())
    }
}

/// Final artifact that is deleted on drop unless released to the caller
#[derive(Debug)]
pub struct PublishedArtifact {
    artifact: FinalArtifact,
    armed: bool,
}

impl PublishedArtifact {
    pub fn new(artifact: FinalArtifact) -> Self {
        Self {
            artifact,
            armed: true,
        }
    }

    /// Hand the file over; from here on the caller must remove it
    pub fn release(mut self) -> FinalArtifact {
        self.armed = false;
        self.artifact.clone()
    }
}

impl Drop for PublishedArtifact {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let FinalArtifact { run_id, path } = &self.artifact;
        match std::fs::remove_file(path) {
            Ok(()) => debug!(run_id = %run_id, path = %path.display(), "unclaimed output removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                let err = DomainError::CleanupFailed(format!("{}: {}", path.display(), e));
                warn!(run_id = %run_id, kind = err.kind(), "{}", err);
            }
        }
    }
}

/// Remove run directories under `parent` older than `max_age`.
///
/// Catches leftovers of processes that died without unwinding. Returns the
/// number of directories removed.
pub fn sweep_stale(parent: &Path, max_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in WalkDir::new(parent)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
    {
        if entry.file_name().to_str().and_then(|n| n.parse::<RunId>().ok()).is_none() {
            continue;
        }
        let age = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|modified| now.duration_since(modified).ok());
        if !matches!(age, Some(age) if age >= max_age) {
            continue;
        }
        match std::fs::remove_dir_all(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %entry.path().display(), error = %e, "could not remove stale run directory"),
        }
    }

    removed
}

/// Remove `<run_id>_final.*` and `<run_id>_download.*` files in `output_dir`
/// older than `max_age`.
///
/// These are service outputs nobody collected before the process went away.
pub fn sweep_stale_outputs(output_dir: &Path, max_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in WalkDir::new(output_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !is_run_output(name) {
            continue;
        }
        let age = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|modified| now.duration_since(modified).ok());
        if !matches!(age, Some(age) if age >= max_age) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %entry.path().display(), error = %e, "could not remove stale output"),
        }
    }

    removed
}

fn is_run_output(name: &str) -> bool {
    let Some((id, rest)) = name.split_once('_') else {
        return false;
    };
    id.parse::<RunId>().is_ok() && (rest.starts_with("final.") || rest.starts_with("download."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn workspace_is_named_by_run_id_and_removed_on_close() {
        let parent = tempfile::tempdir().unwrap();
        let run_id = RunId::new();
        let workspace = RunWorkspace::create(parent.path(), run_id).unwrap();

        let dir = workspace.path().to_path_buf();
        assert_eq!(dir.file_name().unwrap().to_str().unwrap(), run_id.to_string());
        assert!(dir.is_absolute());

        let part = workspace.file("part0", "mp4");
        std::fs::write(&part, b"x").unwrap();
        assert!(part.starts_with(&dir));

        workspace.close().await.unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn dropping_the_workspace_removes_it() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = RunWorkspace::create(parent.path(), RunId::new()).unwrap();
        let dir = workspace.path().to_path_buf();
        drop(workspace);
        assert!(!dir.exists());
    }

    #[test]
    fn same_run_id_cannot_be_reused_concurrently() {
        let parent = tempfile::tempdir().unwrap();
        let run_id = RunId::new();
        let _first = RunWorkspace::create(parent.path(), run_id).unwrap();
        assert!(RunWorkspace::create(parent.path(), run_id).is_err());
    }

    #[test]
    fn sweep_only_touches_old_run_directories() {
        let parent = tempfile::tempdir().unwrap();
        let run_dir = parent.path().join(RunId::new().to_string());
        let other_dir = parent.path().join("keep-me");
        std::fs::create_dir(&run_dir).unwrap();
        std::fs::create_dir(&other_dir).unwrap();

        assert_eq!(sweep_stale(parent.path(), Duration::from_secs(3600)), 0);
        assert_eq!(sweep_stale(parent.path(), Duration::ZERO), 1);
        assert!(!run_dir.exists());
        assert!(other_dir.exists());
    }

    fn published(dir: &Path) -> (PublishedArtifact, PathBuf) {
        let run_id = RunId::new();
        let path = dir.join(run_id.file_name("final", "mp4"));
        std::fs::write(&path, b"clip").unwrap();
        (PublishedArtifact::new(FinalArtifact { run_id, path: path.clone() }), path)
    }

    #[test]
    fn unreleased_output_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let (artifact, path) = published(dir.path());

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn released_output_belongs_to_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let (artifact, path) = published(dir.path());

        let released = artifact.release();
        assert_eq!(released.path, path);
        assert!(path.exists());
    }

    #[test]
    fn output_sweep_only_touches_run_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let run_id = RunId::new();
        let clip = dir.path().join(run_id.file_name("final", "mp4"));
        let download = dir.path().join(RunId::new().file_name("download", "mp3"));
        let mine = dir.path().join("holiday_final.mp4");
        let partial = dir.path().join(run_id.file_name("part0", "mp4"));
        for path in [&clip, &download, &mine, &partial] {
            std::fs::write(path, b"x").unwrap();
        }

        assert_eq!(sweep_stale_outputs(dir.path(), Duration::from_secs(3600)), 0);
        assert_eq!(sweep_stale_outputs(dir.path(), Duration::ZERO), 2);
        assert!(!clip.exists());
        assert!(!download.exists());
        assert!(mine.exists());
        assert!(partial.exists());
    }

    #[test]
    fn sweeping_a_missing_output_dir_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(sweep_stale_outputs(&dir.path().join("absent"), Duration::ZERO), 0);
    }
}
