//! On-disk upload store
//!
//! Uploads live flat in one directory under timestamp-prefixed names. The
//! prefix makes collisions unlikely; `create_new` turns the rare collision
//! into a retry instead of an overwrite.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use intake_core::{stored_file_name, NewUploadedFile};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{Result, StorageError};

const MAX_NAME_ATTEMPTS: usize = 5;

/// Flat directory of uploaded files.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if missing.
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Write `bytes` under a fresh stored name derived from `sanitized`.
    ///
    /// `sanitized` must already have passed the filename sanitizer.
    pub async fn store(&self, sanitized: &str, bytes: &[u8]) -> Result<NewUploadedFile> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self.root.join(stored_file_name(Utc::now(), sanitized));
            let opened = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            let mut file = match opened {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_contents(&mut file, bytes).await {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %cleanup, "Failed to remove partial upload");
                }
                return Err(e.into());
            }

            let stored_path = path.to_string_lossy().into_owned();
            debug!(filename = %sanitized, stored_path = %stored_path, size = bytes.len(), "Stored upload");
            return Ok(NewUploadedFile {
                filename: sanitized.to_string(),
                stored_path,
            });
        }

        Err(StorageError::Collision(sanitized.to_string()))
    }

    /// Delete a stored file. Missing files are not an error.
    pub async fn remove(&self, stored_path: &str) -> Result<()> {
        let path = Path::new(stored_path);
        let escapes = path.components().any(|c| c == Component::ParentDir);
        if escapes || !path.starts_with(&self.root) {
            return Err(StorageError::OutsideRoot(stored_path.to_string()));
        }

        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(stored_path, "Removed upload");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove several files, logging failures instead of stopping.
    ///
    /// Returns how many files were removed without error.
    pub async fn remove_all(&self, stored_paths: &[String]) -> usize {
        let mut removed = 0;
        for stored_path in stored_paths {
            match self.remove(stored_path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(stored_path = %stored_path, error = %e, "Failed to remove upload"),
            }
        }
        removed
    }
}

async fn write_contents(file: &mut fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileStore {
        FileStore::new(dir.path().join("uploads"))
    }

    #[tokio::test]
    async fn test_store_writes_prefixed_file() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store_in(&dir);
        store.ensure_root().await?;

        let file = store.store("menu.pdf", b"%PDF-1.4").await?;
        assert_eq!(file.filename, "menu.pdf");

        let path = Path::new(&file.stored_path);
        assert!(path.starts_with(store.root()));
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let (prefix, rest) = name.split_once('_').unwrap_or_default();
        assert_eq!(prefix.len(), 20);
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "menu.pdf");

        assert_eq!(fs::read(path).await?, b"%PDF-1.4");
        Ok(())
    }

    #[tokio::test]
    async fn test_same_name_twice_never_overwrites() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store_in(&dir);
        store.ensure_root().await?;

        let a = store.store("menu.pdf", b"one").await?;
        let b = store.store("menu.pdf", b"two").await?;

        assert_ne!(a.stored_path, b.stored_path);
        assert_eq!(fs::read(&a.stored_path).await?, b"one");
        assert_eq!(fs::read(&b.stored_path).await?, b"two");
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store_in(&dir);
        store.ensure_root().await?;

        let file = store.store("notes.txt", b"hi").await?;
        store.remove(&file.stored_path).await?;
        assert!(!Path::new(&file.stored_path).exists());
        store.remove(&file.stored_path).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_refuses_paths_outside_root() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store_in(&dir);
        store.ensure_root().await?;

        let outside = dir.path().join("keep.txt");
        fs::write(&outside, b"keep").await?;

        let result = store.remove(&outside.to_string_lossy()).await;
        assert!(matches!(result, Err(StorageError::OutsideRoot(_))));
        assert!(outside.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_all_counts_successes() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store_in(&dir);
        store.ensure_root().await?;

        let a = store.store("a.csv", b"1").await?;
        let b = store.store("b.csv", b"2").await?;
        let removed = store
            .remove_all(&[a.stored_path, b.stored_path, "/etc/hosts".to_string()])
            .await;
        assert_eq!(removed, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_store_leaves_nothing_behind() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store_in(&dir);
        store.ensure_root().await?;

        // Longer than any filesystem allows for one path component.
        let name = format!("{}.pdf", "a".repeat(300));
        assert!(matches!(store.store(&name, b"%PDF").await, Err(StorageError::Io(_))));

        let mut entries = fs::read_dir(store.root()).await?;
        assert!(entries.next_entry().await?.is_none());
        Ok(())
    }
}
