//! Catalog backed by Appwrite database collections.
//!
//! Two collections live in one database: file records (`filename`, `date`)
//! and monthly counters (`year`, `month`, `count`). `run_migrations`
//! provisions the database, the collections and their attributes when they
//! are missing.
//!
//! The counter increment is a read followed by a write with no
//! compare-and-swap: concurrent uploads in the same month can under-count.

use super::{CatalogManager, FileRecord, MonthlyUploadCount};
use crate::appwrite::{AppwriteClient, Query};
use crate::id::{generate_file_record_id, generate_monthly_count_id};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Display name of the provisioned database.
const DATABASE_NAME: &str = "csv-files";
const FILES_COLLECTION_NAME: &str = "csv-files-data";
const COUNTS_COLLECTION_NAME: &str = "csv-files-count";

/// Page size when reading every counter document.
const COUNTS_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct CountDocument {
    #[serde(rename = "$id", default)]
    id: String,
    year: i32,
    month: u32,
    count: u64,
}

#[derive(Debug, Deserialize)]
struct DocumentList<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

#[derive(Debug, Serialize)]
struct FileDocument<'a> {
    filename: &'a str,
    date: String,
}

/// Catalog stored in Appwrite collections.
#[derive(Debug)]
pub struct AppwriteCatalogManager {
    client: AppwriteClient,
    database_id: String,
    files_collection_id: String,
    counts_collection_id: String,
}

impl AppwriteCatalogManager {
    pub fn new(
        client: AppwriteClient,
        database_id: &str,
        files_collection_id: &str,
        counts_collection_id: &str,
    ) -> Self {
        Self {
            client,
            database_id: database_id.to_string(),
            files_collection_id: files_collection_id.to_string(),
            counts_collection_id: counts_collection_id.to_string(),
        }
    }

    fn database_path(&self) -> String {
        format!("/databases/{}", self.database_id)
    }

    fn collection_path(&self, collection_id: &str) -> String {
        format!("/databases/{}/collections/{}", self.database_id, collection_id)
    }

    fn documents_path(&self, collection_id: &str) -> String {
        format!("{}/documents", self.collection_path(collection_id))
    }

    async fn ensure_database(&self) -> Result<()> {
        if self
            .client
            .get_json::<Value>(&self.database_path(), &[])
            .await?
            .is_none()
        {
            tracing::info!(database_id = %self.database_id, "Creating database");
            let _: Value = self
                .client
                .post_json(
                    "/databases",
                    &json!({
                        "databaseId": self.database_id,
                        "name": DATABASE_NAME,
                        "enabled": true,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    /// Create a collection and its attributes if it does not exist yet.
    async fn ensure_collection(&self, collection_id: &str, name: &str, attributes: &[(&str, Value)]) -> Result<()> {
        let path = self.collection_path(collection_id);
        if self.client.get_json::<Value>(&path, &[]).await?.is_some() {
            return Ok(());
        }

        tracing::info!(collection_id, "Creating collection");
        let _: Value = self
            .client
            .post_json(
                &format!("{}/collections", self.database_path()),
                &json!({
                    "collectionId": collection_id,
                    "name": name,
                    "permissions": [r#"create("any")"#, r#"read("any")"#],
                    "documentSecurity": false,
                    "enabled": true,
                }),
            )
            .await?;

        for (kind, body) in attributes {
            let _: Value = self
                .client
                .post_json(&format!("{}/attributes/{}", path, kind), body)
                .await?;
        }
        Ok(())
    }

    async fn find_count(&self, year: i32, month: u32) -> Result<Option<CountDocument>> {
        let list = self
            .client
            .get_json::<DocumentList<CountDocument>>(
                &self.documents_path(&self.counts_collection_id),
                &[
                    Query::Equal("year", json!(year)),
                    Query::Equal("month", json!(month)),
                    Query::Limit(1),
                ],
            )
            .await?;
        Ok(list.and_then(|list| list.documents.into_iter().next()))
    }
}

#[async_trait]
impl CatalogManager for AppwriteCatalogManager {
    async fn run_migrations(&self) -> Result<()> {
        self.ensure_database().await?;

        self.ensure_collection(
            &self.files_collection_id,
            FILES_COLLECTION_NAME,
            &[
                (
                    "string",
                    json!({"key": "filename", "size": 100, "required": true, "array": false}),
                ),
                (
                    "datetime",
                    json!({"key": "date", "required": true, "array": false}),
                ),
            ],
        )
        .await?;

        self.ensure_collection(
            &self.counts_collection_id,
            COUNTS_COLLECTION_NAME,
            &[
                (
                    "integer",
                    json!({"key": "year", "required": true, "array": false}),
                ),
                (
                    "integer",
                    json!({"key": "month", "required": true, "min": 1, "max": 12, "array": false}),
                ),
                (
                    "integer",
                    json!({"key": "count", "required": true, "min": 0, "array": false}),
                ),
            ],
        )
        .await?;

        Ok(())
    }

    async fn insert_file_record(&self, record: &FileRecord) -> Result<()> {
        let data = FileDocument {
            filename: &record.filename,
            date: record.uploaded_at.to_rfc3339(),
        };
        let _: Value = self
            .client
            .post_json(
                &self.documents_path(&self.files_collection_id),
                &json!({"documentId": generate_file_record_id(), "data": data}),
            )
            .await?;
        Ok(())
    }

    async fn increment_monthly_count(&self, year: i32, month: u32) -> Result<u64> {
        let path = self.documents_path(&self.counts_collection_id);
        match self.find_count(year, month).await? {
            Some(doc) => {
                let count = doc.count + 1;
                let _: Value = self
                    .client
                    .patch_json(
                        &format!("{}/{}", path, doc.id),
                        &json!({"data": {"count": count}}),
                    )
                    .await?;
                Ok(count)
            }
            None => {
                let _: Value = self
                    .client
                    .post_json(
                        &path,
                        &json!({
                            "documentId": generate_monthly_count_id(),
                            "data": {"year": year, "month": month, "count": 1},
                        }),
                    )
                    .await?;
                Ok(1)
            }
        }
    }

    async fn list_monthly_counts(&self) -> Result<Vec<MonthlyUploadCount>> {
        let path = self.documents_path(&self.counts_collection_id);
        let mut counts = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .client
                .get_json::<DocumentList<CountDocument>>(
                    &path,
                    &[
                        Query::Select(vec!["$id", "year", "month", "count"]),
                        Query::Limit(COUNTS_PAGE_SIZE),
                        Query::Offset(offset),
                    ],
                )
                .await?
                .map(|list| list.documents)
                .unwrap_or_default();

            let fetched = page.len();
            counts.extend(page.into_iter().map(|doc| MonthlyUploadCount {
                year: doc.year,
                month: doc.month,
                count: doc.count,
            }));

            if fetched < COUNTS_PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        Ok(counts)
    }
}
