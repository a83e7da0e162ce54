use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Metadata written for every successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Number of uploads in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyUploadCount {
    pub year: i32,
    /// 1-12
    pub month: u32,
    pub count: u64,
}

/// Async interface for the metadata database.
#[async_trait]
pub trait CatalogManager: Debug + Send + Sync {
    /// Close the catalog connection. This is idempotent and can be called multiple times.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Create whatever schema or collections are missing. Should be idempotent.
    async fn run_migrations(&self) -> Result<()>;

    async fn insert_file_record(&self, record: &FileRecord) -> Result<()>;

    /// Add one upload to the `(year, month)` counter, creating it at 1 when
    /// absent. Returns the new count.
    async fn increment_monthly_count(&self, year: i32, month: u32) -> Result<u64>;

    async fn list_monthly_counts(&self) -> Result<Vec<MonthlyUploadCount>>;
}
