//! Storage capacity policies applied before each upload.

use crate::storage::{BucketConfig, FileOrder, FileStore};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Default number of files the bucket may hold.
pub const DEFAULT_MAX_FILES: usize = 120;

/// What to do when the bucket is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Delete the oldest files so that the upload leaves at most
    /// `max_files` in the bucket.
    #[default]
    EvictOldest,
    /// Once more than `max_files` are stored, drop the whole bucket and
    /// create it again empty. Every stored file id becomes invalid.
    RecreateBucket,
}

/// Make room for one more file. Returns how many files were removed.
pub async fn enforce_capacity(
    store: &dyn FileStore,
    policy: CapacityPolicy,
    max_files: usize,
    bucket: &BucketConfig,
) -> Result<usize> {
    let total = store.count_files().await?;

    match policy {
        CapacityPolicy::EvictOldest => {
            if total < max_files {
                return Ok(0);
            }
            let excess = total + 1 - max_files.max(1);
            let oldest = store.list_files(FileOrder::OldestFirst, excess).await?;

            let mut evicted = 0;
            for file in &oldest {
                if store.delete_file(&file.id).await? {
                    evicted += 1;
                }
            }
            tracing::info!(evicted, max_files, "Evicted oldest files");
            Ok(evicted)
        }
        CapacityPolicy::RecreateBucket => {
            if total <= max_files {
                return Ok(0);
            }
            tracing::warn!(total, max_files, "Bucket over capacity, recreating it");
            store.recreate_bucket(bucket).await?;
            Ok(total)
        }
    }
}
