//! Local-disk storage for complaint photos.
//!
//! Photos are written before the submitting transaction opens and removed
//! again if it fails, so a stored file without a complaint row only
//! survives a crash between the two steps.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under a fresh name with extension `ext`.
    ///
    /// Returns the reference stored on the complaint (the file name
    /// relative to the store root).
    pub async fn save(&self, ext: &str, bytes: &[u8]) -> io::Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;
        let reference = format!("{}.{ext}", Uuid::now_v7());
        tokio::fs::write(self.root.join(&reference), bytes).await?;
        Ok(reference)
    }

    /// Best-effort removal; failures are logged, not returned.
    pub async fn delete(&self, reference: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(reference)).await {
            tracing::warn!(photo = %reference, error = %e, "Failed to remove orphaned photo");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PhotoStore::new(dir.path().join("photos"));

        let reference = store.save("png", b"\x89PNG").await.expect("save");
        assert!(reference.ends_with(".png"));
        let path = store.root().join(&reference);
        assert_eq!(tokio::fs::read(&path).await.expect("read"), b"\x89PNG");

        store.delete(&reference).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn names_are_unique() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PhotoStore::new(dir.path());
        let a = store.save("jpg", b"a").await.expect("save");
        let b = store.save("jpg", b"b").await.expect("save");
        assert_ne!(a, b);
    }
}
