// Local filesystem adapter - tokio::fs backed file operations

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::ports::*;

/// Local filesystem adapter
#[derive(Debug, Default, Clone)]
pub struct FsLocalAdapter;

impl FsLocalAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn fs_fail(action: &str, path: &Path, e: std::io::Error) -> DomainError {
    DomainError::FsFail(format!("Failed to {} {}: {}", action, path.display(), e))
}

#[async_trait]
impl FsPort for FsLocalAdapter {
    async fn create_directory(&self, path: &Path) -> Result<(), DomainError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| fs_fail("create directory", path, e))
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), DomainError> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| fs_fail("write", path, e))
    }

    async fn delete_file(&self, path: &Path) -> Result<(), DomainError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(fs_fail("delete", path, e)),
        }
    }

    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), DomainError> {
        if let Some(parent) = to.parent() {
            self.create_directory(parent).await?;
        }

        // rename fails across filesystems (EXDEV); fall back to copy + delete
        if tokio::fs::rename(from, to).await.is_ok() {
            return Ok(());
        }
        tokio::fs::copy(from, to)
            .await
            .map_err(|e| fs_fail("copy", from, e))?;
        if let Err(e) = tokio::fs::remove_file(from).await {
            tracing::warn!(path = %from.display(), error = %e, "moved file but could not remove the original");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn move_creates_parent_and_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let fs = FsLocalAdapter::new();
        let from = dir.path().join("a.mp4");
        let to = dir.path().join("nested").join("b.mp4");
        fs.write_file(&from, "data").await.unwrap();

        fs.move_file(&from, &to).await.unwrap();

        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "data");
    }

    #[tokio::test]
    async fn deleting_a_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let fs = FsLocalAdapter::new();
        fs.delete_file(&dir.path().join("nope")).await.unwrap();
    }

    #[tokio::test]
    async fn write_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let fs = FsLocalAdapter::new();
        let path = dir.path().join("list.txt");
        fs.write_file(&path, "file 'a.mp4'\n").await.unwrap();
        assert!(path.is_file());

        fs.delete_file(&path).await.unwrap();
        assert!(!path.exists());
    }
}
