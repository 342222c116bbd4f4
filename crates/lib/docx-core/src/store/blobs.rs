use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use super::{StoreError, StoreResult};

/// Flat directory of named byte blobs: working copies, version snapshots,
/// templates and export artifacts.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Opens a blob directory, creating it when missing.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Writes a blob. The bytes land in a temporary file first and are renamed
    /// into place, so readers never see a partial blob.
    ///
    /// # Errors
    /// Returns `StoreError` for an invalid key or a failed write.
    pub async fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<u64> {
        let path = self.path_for(key)?;
        let staging = self.root.join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&staging, bytes).await?;
        if let Err(err) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }
        Ok(bytes.len() as u64)
    }

    /// # Errors
    /// Returns `StoreError::MissingBlob` when the key does not exist.
    pub async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::MissingBlob(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Removes a blob. Returns `false` when it did not exist.
    ///
    /// # Errors
    /// Returns `StoreError` for an invalid key or a failed delete.
    pub async fn delete(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Copies one blob to another key, returning the copied size.
    ///
    /// # Errors
    /// Returns `StoreError::MissingBlob` when the source does not exist.
    pub async fn copy(&self, from: &str, to: &str) -> StoreResult<u64> {
        let bytes = self.get(from).await?;
        self.put(to, &bytes).await
    }

    /// # Errors
    /// Returns `StoreError` for an invalid key.
    pub async fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}

fn validate_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && !key.contains("..")
        && !key.contains(['/', '\\', ':', '\0']);
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidInput(format!("invalid blob key: {key:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_copy_delete() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = BlobStore::open(dir.path().join("blobs")).await.unwrap();
        assert_eq!(blobs.put("a.docx", b"hello").await.unwrap(), 5);
        assert_eq!(blobs.get("a.docx").await.unwrap(), b"hello");
        blobs.copy("a.docx", "a.v1.docx").await.unwrap();
        assert!(blobs.exists("a.v1.docx").await.unwrap());
        assert!(blobs.delete("a.docx").await.unwrap());
        assert!(!blobs.delete("a.docx").await.unwrap());
        assert!(matches!(
            blobs.get("a.docx").await,
            Err(StoreError::MissingBlob(_))
        ));
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = BlobStore::open(dir.path()).await.unwrap();
        for key in ["", "../x", "a/b", "a\\b", ".hidden", "x..y"] {
            assert!(
                matches!(blobs.put(key, b"x").await, Err(StoreError::InvalidInput(_))),
                "{key}"
            );
        }
    }
}
