// src/storage/filesystem.rs
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{BucketConfig, FileOrder, FileStore, StoredFile};
use crate::id::is_valid_file_id;

/// Suffix of the metadata sidecar written next to each file.
const META_SUFFIX: &str = ".meta.json";

/// Suffix of a sidecar being written, renamed into place once complete.
const META_TMP_SUFFIX: &str = ".meta.json.tmp";

/// Local directory standing in for a storage bucket.
///
/// Each file is kept at `{dir}/{id}` with its [`StoredFile`] metadata in
/// `{dir}/{id}.meta.json`.
#[derive(Debug)]
pub struct FilesystemStore {
    dir: PathBuf,
    bucket: BucketConfig,
}

impl FilesystemStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_bucket(dir, BucketConfig::default())
    }

    pub fn with_bucket(dir: impl Into<PathBuf>, bucket: BucketConfig) -> Self {
        Self {
            dir: dir.into(),
            bucket,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn data_path(&self, file_id: &str) -> PathBuf {
        self.dir.join(file_id)
    }

    fn meta_path(&self, file_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}", file_id, META_SUFFIX))
    }

    fn meta_tmp_path(&self, file_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}", file_id, META_TMP_SUFFIX))
    }

    /// Readers only ever see a missing or a complete sidecar.
    async fn write_meta(&self, stored: &StoredFile) -> Result<()> {
        let tmp = self.meta_tmp_path(&stored.id);
        fs::write(&tmp, serde_json::to_vec(stored)?).await?;
        fs::rename(&tmp, self.meta_path(&stored.id)).await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<StoredFile>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.ends_with(META_SUFFIX) {
                continue;
            }
            let raw = match fs::read(entry.path()).await {
                Ok(raw) => raw,
                // Deleted between listing and reading.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            match serde_json::from_slice::<StoredFile>(&raw) {
                Ok(stored) => files.push(stored),
                Err(e) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "Skipping unreadable metadata file"
                    );
                }
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl FileStore for FilesystemStore {
    async fn create_file(&self, file_id: &str, name: &str, data: &[u8]) -> Result<StoredFile> {
        if !is_valid_file_id(file_id) {
            bail!("Invalid file id: {}", file_id);
        }
        if data.len() as u64 > self.bucket.maximum_file_size {
            bail!(
                "File exceeds maximum size of {} bytes",
                self.bucket.maximum_file_size
            );
        }
        if !self.bucket.allows_name(name) {
            bail!("File extension not allowed: {}", name);
        }

        fs::create_dir_all(&self.dir).await?;

        let stored = StoredFile {
            id: file_id.to_string(),
            name: name.to_string(),
            size_bytes: data.len() as u64,
            created_at: Utc::now(),
        };

        // Data first: a listed file must always be readable.
        fs::write(self.data_path(file_id), data).await?;
        self.write_meta(&stored).await?;

        Ok(stored)
    }

    async fn read_file(&self, file_id: &str) -> Result<Option<Vec<u8>>> {
        if !is_valid_file_id(file_id) {
            return Ok(None);
        }
        match fs::read(self.data_path(file_id)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_files(&self, order: FileOrder, limit: usize) -> Result<Vec<StoredFile>> {
        let mut files = self.load_all().await?;
        files.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        if order == FileOrder::NewestFirst {
            files.reverse();
        }
        files.truncate(limit);
        Ok(files)
    }

    async fn count_files(&self) -> Result<usize> {
        Ok(self.load_all().await?.len())
    }

    async fn delete_file(&self, file_id: &str) -> Result<bool> {
        if !is_valid_file_id(file_id) {
            return Ok(false);
        }
        let existed = match fs::remove_file(self.meta_path(file_id)).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match fs::remove_file(self.data_path(file_id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(existed)
    }

    async fn recreate_bucket(&self, _config: &BucketConfig) -> Result<()> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (FilesystemStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (FilesystemStore::new(dir.path().join("files")), dir)
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let (store, _dir) = store();
        let stored = store.create_file("file1", "a.csv", b"a,b").await.unwrap();
        assert_eq!(stored.name, "a.csv");
        assert_eq!(stored.size_bytes, 3);
        assert_eq!(store.read_file("file1").await.unwrap(), Some(b"a,b".to_vec()));
    }

    #[tokio::test]
    async fn test_read_missing_returns_none() {
        let (store, _dir) = store();
        assert_eq!(store.read_file("nope").await.unwrap(), None);
        assert_eq!(store.read_file("../escape").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_orders_by_creation() {
        let (store, _dir) = store();
        for id in ["f1", "f2", "f3"] {
            store.create_file(id, "x.csv", b"x").await.unwrap();
        }
        let newest: Vec<_> = store
            .list_files(FileOrder::NewestFirst, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(newest, vec!["f3", "f2", "f1"]);

        let oldest = store.list_files(FileOrder::OldestFirst, 2).await.unwrap();
        assert_eq!(oldest.len(), 2);
        assert_eq!(oldest[0].id, "f1");
        assert_eq!(store.count_files().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_file() {
        let (store, _dir) = store();
        store.create_file("f1", "x.csv", b"x").await.unwrap();
        assert!(store.delete_file("f1").await.unwrap());
        assert!(!store.delete_file("f1").await.unwrap());
        assert_eq!(store.read_file("f1").await.unwrap(), None);
        assert_eq!(store.count_files().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recreate_bucket_removes_everything() {
        let (store, _dir) = store();
        store.create_file("f1", "x.csv", b"x").await.unwrap();
        store.create_file("f2", "y.csv", b"y").await.unwrap();
        store.recreate_bucket(&BucketConfig::default()).await.unwrap();
        assert_eq!(store.count_files().await.unwrap(), 0);
        assert!(store.dir().exists());
    }

    #[tokio::test]
    async fn test_unreadable_metadata_is_skipped() {
        let (store, _dir) = store();
        store.create_file("f1", "x.csv", b"x").await.unwrap();
        tokio::fs::write(store.dir().join("partial.meta.json"), b"")
            .await
            .unwrap();
        tokio::fs::write(store.dir().join("garbage.meta.json"), b"{\"id\":")
            .await
            .unwrap();

        assert_eq!(store.count_files().await.unwrap(), 1);
        let files = store.list_files(FileOrder::NewestFirst, 10).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "f1");
    }

    #[tokio::test]
    async fn test_no_temporary_sidecar_left_behind() {
        let (store, _dir) = store();
        store.create_file("f1", "x.csv", b"x").await.unwrap();
        assert!(store.dir().join("f1.meta.json").exists());
        assert!(!store.dir().join("f1.meta.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_bucket_rules_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = BucketConfig {
            maximum_file_size: 4,
            ..Default::default()
        };
        let store = FilesystemStore::with_bucket(dir.path(), bucket);
        assert!(store.create_file("f1", "x.csv", b"12345").await.is_err());
        assert!(store.create_file("f2", "x.txt", b"1").await.is_err());
        assert!(store.create_file("f3", "x.csv", b"1").await.is_ok());
    }
}
