// src/storage/mod.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod appwrite;
pub mod filesystem;

// Re-exports
pub use appwrite::AppwriteStore;
pub use filesystem::FilesystemStore;

/// Allowed extension for stored files.
pub const CSV_EXTENSION: &str = "csv";

/// Maximum size of a single stored file: 50MB.
pub const MAX_FILE_SIZE: u64 = 50_000_000;

/// A file held by the storage backend. Content is fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Ordering of [`FileStore::list_files`] by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOrder {
    NewestFirst,
    OldestFirst,
}

/// Settings a bucket is (re)created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketConfig {
    pub name: String,
    pub permissions: Vec<String>,
    pub file_security: bool,
    pub enabled: bool,
    pub maximum_file_size: u64,
    pub allowed_file_extensions: Vec<String>,
    pub compression: String,
    pub encryption: bool,
    pub antivirus: bool,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            name: "csv-files".to_string(),
            permissions: vec![r#"create("any")"#.to_string(), r#"read("any")"#.to_string()],
            file_security: false,
            enabled: true,
            maximum_file_size: MAX_FILE_SIZE,
            allowed_file_extensions: vec![CSV_EXTENSION.to_string()],
            compression: "none".to_string(),
            encryption: true,
            antivirus: true,
        }
    }
}

impl BucketConfig {
    /// Whether `name` carries one of the allowed extensions.
    pub fn allows_name(&self, name: &str) -> bool {
        self.allowed_file_extensions.is_empty()
            || name
                .rsplit('.')
                .next()
                .is_some_and(|ext| self.allowed_file_extensions.iter().any(|a| a == ext))
    }
}

/// Object storage holding uploaded CSV blobs.
///
/// Lookups of unknown ids return `Ok(None)`; `Err` is reserved for backend
/// failures.
#[async_trait]
pub trait FileStore: Debug + Send + Sync {
    /// Store `data` under `file_id` and return the stored file's metadata.
    async fn create_file(&self, file_id: &str, name: &str, data: &[u8]) -> Result<StoredFile>;

    /// Raw content of a stored file.
    async fn read_file(&self, file_id: &str) -> Result<Option<Vec<u8>>>;

    /// Up to `limit` files ordered by creation time.
    async fn list_files(&self, order: FileOrder, limit: usize) -> Result<Vec<StoredFile>>;

    /// Total number of stored files.
    async fn count_files(&self) -> Result<usize>;

    /// Delete a file. Returns false if it did not exist.
    async fn delete_file(&self, file_id: &str) -> Result<bool>;

    /// Destroy the container with all its files and create it again empty.
    async fn recreate_bucket(&self, config: &BucketConfig) -> Result<()>;
}
