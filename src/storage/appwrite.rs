// src/storage/appwrite.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;

use super::{BucketConfig, FileOrder, FileStore, StoredFile};
use crate::appwrite::{AppwriteClient, Query};

/// Attribute used to order files by age.
const CREATED_AT: &str = "$createdAt";

/// Appwrite caps list pages at this size.
const MAX_PAGE_SIZE: usize = 5000;

#[derive(Debug, Deserialize)]
struct AppwriteFile {
    #[serde(rename = "$id")]
    id: String,
    name: String,
    #[serde(rename = "sizeOriginal", default)]
    size_original: u64,
    #[serde(rename = "$createdAt")]
    created_at: DateTime<Utc>,
}

impl From<AppwriteFile> for StoredFile {
    fn from(file: AppwriteFile) -> Self {
        StoredFile {
            id: file.id,
            name: file.name,
            size_bytes: file.size_original,
            created_at: file.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    total: usize,
    #[serde(default)]
    files: Vec<AppwriteFile>,
}

/// Storage bucket on an Appwrite backend.
#[derive(Debug)]
pub struct AppwriteStore {
    client: AppwriteClient,
    bucket_id: String,
}

impl AppwriteStore {
    pub fn new(client: AppwriteClient, bucket_id: &str) -> Self {
        Self {
            client,
            bucket_id: bucket_id.to_string(),
        }
    }

    fn files_path(&self) -> String {
        format!("/storage/buckets/{}/files", self.bucket_id)
    }

    fn file_path(&self, file_id: &str) -> String {
        format!("/storage/buckets/{}/files/{}", self.bucket_id, file_id)
    }

    async fn fetch_list(&self, queries: &[Query]) -> Result<FileList> {
        Ok(self
            .client
            .get_json::<FileList>(&self.files_path(), queries)
            .await?
            .unwrap_or(FileList {
                total: 0,
                files: vec![],
            }))
    }
}

#[async_trait]
impl FileStore for AppwriteStore {
    async fn create_file(&self, file_id: &str, name: &str, data: &[u8]) -> Result<StoredFile> {
        let part = Part::bytes(data.to_vec())
            .file_name(name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().text("fileId", file_id.to_string()).part("file", part);

        let file: AppwriteFile = self.client.post_multipart(&self.files_path(), form).await?;
        Ok(file.into())
    }

    async fn read_file(&self, file_id: &str) -> Result<Option<Vec<u8>>> {
        self.client
            .get_bytes(&format!("{}/view", self.file_path(file_id)))
            .await
    }

    async fn list_files(&self, order: FileOrder, limit: usize) -> Result<Vec<StoredFile>> {
        let order = match order {
            FileOrder::NewestFirst => Query::OrderDesc(CREATED_AT),
            FileOrder::OldestFirst => Query::OrderAsc(CREATED_AT),
        };
        let list = self
            .fetch_list(&[order, Query::Limit(limit.min(MAX_PAGE_SIZE))])
            .await?;
        Ok(list.files.into_iter().map(StoredFile::from).collect())
    }

    async fn count_files(&self) -> Result<usize> {
        Ok(self.fetch_list(&[Query::Limit(1)]).await?.total)
    }

    async fn delete_file(&self, file_id: &str) -> Result<bool> {
        self.client.delete(&self.file_path(file_id)).await
    }

    async fn recreate_bucket(&self, config: &BucketConfig) -> Result<()> {
        self.client
            .delete(&format!("/storage/buckets/{}", self.bucket_id))
            .await?;

        let mut body = serde_json::to_value(config)?;
        body["bucketId"] = json!(self.bucket_id);
        let _: serde_json::Value = self.client.post_json("/storage/buckets", &body).await?;

        tracing::info!(bucket_id = %self.bucket_id, "Recreated storage bucket");
        Ok(())
    }
}
