use crate::appwrite::AppwriteClient;
use crate::catalog::{AppwriteCatalogManager, CatalogManager, FileRecord, SqliteCatalogManager};
use crate::config::AppConfig;
use crate::files::{
    aggregate_stats, enforce_capacity, validate_format, CapacityPolicy, FileError, FileStats,
    DEFAULT_MAX_FILES,
};
use crate::id::{generate_file_id, is_valid_file_id};
use crate::parser::{
    project, project_all, resolve_headers, tokenize_rows, ProjectedRow, DEFAULT_HEADER_ROW,
};
use crate::storage::{AppwriteStore, BucketConfig, FileOrder, FileStore, FilesystemStore};
use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Default number of files returned by [`CsvEngine::list_files`].
pub const DEFAULT_PAGE_SIZE: usize = 150;

/// A CSV upload as received from a client.
#[derive(Debug, Clone)]
pub struct CsvUpload {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFile {
    pub id: String,
    pub name: String,
    /// Cells of the first row of the uploaded text.
    pub headers: Vec<String>,
}

/// One entry of the files list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub id: String,
    pub name: String,
    pub uploaded_at: NaiveDate,
}

/// Ties the file store and the catalog together and runs every file
/// operation exposed over HTTP.
pub struct CsvEngine {
    store: Arc<dyn FileStore>,
    catalog: Arc<dyn CatalogManager>,
    bucket: BucketConfig,
    capacity_policy: CapacityPolicy,
    max_files: usize,
    page_size: usize,
}

impl CsvEngine {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create an engine with default settings at the given base directory.
    ///
    /// Uses SQLite catalog at {base_dir}/catalog.db and filesystem storage at {base_dir}/files.
    pub async fn defaults(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().base_dir(base_dir).build().await
    }

    /// Create a builder for more control over engine configuration.
    pub fn builder() -> CsvEngineBuilder {
        CsvEngineBuilder::new()
    }

    /// Create a new engine from application configuration.
    ///
    /// Local backends are created by the builder; only Appwrite backends are
    /// constructed here.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let mut builder = CsvEngine::builder()
            .capacity_policy(config.storage.capacity_policy)
            .max_files(config.storage.max_files)
            .page_size(config.listing.page_size);

        if let Some(base) = &config.paths.base_dir {
            builder = builder.base_dir(PathBuf::from(base));
        }

        if config.storage.storage_type == "appwrite" || config.catalog.catalog_type == "appwrite" {
            let client = Self::appwrite_client(config)?;

            if config.storage.storage_type == "appwrite" {
                let bucket_id = config
                    .storage
                    .bucket_id
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("Appwrite storage requires 'bucket_id'"))?;
                builder = builder.store(Arc::new(AppwriteStore::new(client.clone(), bucket_id)));
            }

            if config.catalog.catalog_type == "appwrite" {
                let catalog = &config.catalog;
                let require = |value: &Option<String>, name: &str| {
                    value
                        .clone()
                        .ok_or_else(|| anyhow::anyhow!("Appwrite catalog requires '{}'", name))
                };
                builder = builder.catalog(Arc::new(AppwriteCatalogManager::new(
                    client,
                    &require(&catalog.database_id, "database_id")?,
                    &require(&catalog.files_collection_id, "files_collection_id")?,
                    &require(&catalog.counts_collection_id, "counts_collection_id")?,
                )));
            }
        }

        builder.build().await
    }

    fn appwrite_client(config: &AppConfig) -> Result<AppwriteClient> {
        let project_id = config
            .appwrite
            .project_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Appwrite backend requires 'project_id'"))?;
        let api_key = config
            .appwrite
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Appwrite backend requires 'api_key'"))?;
        AppwriteClient::new(&config.appwrite.endpoint, project_id, api_key)
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.store
    }

    pub fn catalog(&self) -> Arc<dyn CatalogManager> {
        self.catalog.clone()
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    // =========================================================================
    // Upload ingestion
    // =========================================================================

    /// Validate and store an upload, then record its metadata.
    ///
    /// The file is durable once this returns `Ok`. Metadata and counter
    /// writes happen afterwards and are best-effort: their failures are
    /// logged and do not fail the upload.
    #[tracing::instrument(
        name = "ingest",
        skip(self, upload),
        fields(
            csvdock.file_name = %upload.name,
            csvdock.size_bytes = upload.bytes.len(),
            csvdock.file_id = tracing::field::Empty,
        )
    )]
    pub async fn ingest(&self, upload: CsvUpload) -> Result<IngestedFile, FileError> {
        validate_format(&upload.name, upload.mime_type.as_deref())?;

        if upload.bytes.is_empty() {
            return Err(FileError::Validation("Upload cannot be empty".to_string()));
        }
        if upload.bytes.len() as u64 > self.bucket.maximum_file_size {
            return Err(FileError::Validation(format!(
                "Upload exceeds maximum size of {} bytes",
                self.bucket.maximum_file_size
            )));
        }

        enforce_capacity(
            self.store.as_ref(),
            self.capacity_policy,
            self.max_files,
            &self.bucket,
        )
        .await
        .map_err(|e| backend_error("validate bucket capacity", e))?;

        let stored = self
            .store
            .create_file(&generate_file_id(), &upload.name, &upload.bytes)
            .await
            .map_err(|e| backend_error("store file", e))?;

        tracing::Span::current().record("csvdock.file_id", stored.id.as_str());

        self.record_upload(&stored.name, Utc::now()).await;

        let text = String::from_utf8_lossy(&upload.bytes);
        let headers = resolve_headers(&tokenize_rows(&text), DEFAULT_HEADER_ROW)?;

        info!(file_id = %stored.id, "File uploaded");

        Ok(IngestedFile {
            id: stored.id,
            name: stored.name,
            headers,
        })
    }

    async fn record_upload(&self, filename: &str, at: DateTime<Utc>) {
        let record = FileRecord {
            filename: filename.to_string(),
            uploaded_at: at,
        };
        if let Err(e) = self.catalog.insert_file_record(&record).await {
            warn!(error = %e, "Failed to insert file record");
        }
        if let Err(e) = self.catalog.increment_monthly_count(at.year(), at.month()).await {
            warn!(error = %e, "Failed to increment monthly upload count");
        }
    }

    // =========================================================================
    // File reads
    // =========================================================================

    async fn fetch_text(&self, file_id: &str) -> Result<String, FileError> {
        if !is_valid_file_id(file_id) {
            return Err(FileError::NotFound(format!("File '{}' not found", file_id)));
        }
        let bytes = self
            .store
            .read_file(file_id)
            .await
            .map_err(|e| backend_error("read file", e))?
            .ok_or_else(|| FileError::NotFound(format!("File '{}' not found", file_id)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Header names at the 1-based `header_row` of a stored file.
    #[tracing::instrument(name = "file_headers", skip(self), fields(csvdock.file_id = %file_id))]
    pub async fn file_headers(&self, file_id: &str, header_row: usize) -> Result<Vec<String>, FileError> {
        let text = self.fetch_text(file_id).await?;
        Ok(resolve_headers(&tokenize_rows(&text), header_row)?)
    }

    /// Rows of a stored file projected onto the `requested` columns.
    #[tracing::instrument(
        name = "file_data",
        skip(self, requested),
        fields(csvdock.file_id = %file_id, csvdock.row_count = tracing::field::Empty)
    )]
    pub async fn file_data(
        &self,
        file_id: &str,
        header_row: usize,
        requested: &[String],
    ) -> Result<Vec<ProjectedRow>, FileError> {
        let text = self.fetch_text(file_id).await?;
        let rows = tokenize_rows(&text);
        let headers = resolve_headers(&rows, header_row)?;
        let projected = project(&rows, &headers, requested, header_row)?;

        tracing::Span::current().record("csvdock.row_count", projected.len());
        Ok(projected)
    }

    /// Rows of a stored file keyed by every non-empty header.
    #[tracing::instrument(name = "file_rows", skip(self), fields(csvdock.file_id = %file_id))]
    pub async fn file_rows(&self, file_id: &str, header_row: usize) -> Result<Vec<ProjectedRow>, FileError> {
        let text = self.fetch_text(file_id).await?;
        Ok(project_all(&tokenize_rows(&text), header_row)?)
    }

    // =========================================================================
    // Listing & stats
    // =========================================================================

    /// Most recently uploaded files first, capped at the page size.
    pub async fn list_files(&self) -> Result<Vec<FileSummary>, FileError> {
        let files = self
            .store
            .list_files(FileOrder::NewestFirst, self.page_size)
            .await
            .map_err(|e| backend_error("list files", e))?;

        Ok(files
            .into_iter()
            .map(|file| FileSummary {
                id: file.id,
                name: file.name,
                uploaded_at: file.created_at.date_naive(),
            })
            .collect())
    }

    /// Upload counts per year and month.
    pub async fn file_stats(&self) -> Result<FileStats, FileError> {
        let counts = self
            .catalog
            .list_monthly_counts()
            .await
            .map_err(|e| backend_error("list monthly counts", e))?;
        Ok(aggregate_stats(&counts))
    }

    /// Close the catalog connection.
    pub async fn shutdown(&self) -> Result<()> {
        self.catalog.close().await
    }
}

fn backend_error(operation: &str, e: anyhow::Error) -> FileError {
    error!(error = ?e, operation, "Backend operation failed");
    FileError::Backend(e)
}

pub struct CsvEngineBuilder {
    base_dir: Option<PathBuf>,
    store: Option<Arc<dyn FileStore>>,
    catalog: Option<Arc<dyn CatalogManager>>,
    bucket: BucketConfig,
    capacity_policy: CapacityPolicy,
    max_files: usize,
    page_size: usize,
}

impl Default for CsvEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvEngineBuilder {
    pub fn new() -> Self {
        Self {
            base_dir: None,
            store: None,
            catalog: None,
            bucket: BucketConfig::default(),
            capacity_policy: CapacityPolicy::default(),
            max_files: DEFAULT_MAX_FILES,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the base directory for local data.
    /// Defaults to ~/.csvdock if not set.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Set a custom file store.
    /// If not set, creates filesystem storage at {base_dir}/files
    pub fn store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set a custom catalog manager.
    /// If not set, creates a SQLite catalog at {base_dir}/catalog.db
    pub fn catalog(mut self, catalog: Arc<dyn CatalogManager>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Settings used when the bucket is recreated, and the upload size limit.
    pub fn bucket(mut self, bucket: BucketConfig) -> Self {
        self.bucket = bucket;
        self
    }

    pub fn capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.capacity_policy = policy;
        self
    }

    /// Number of files the bucket may hold. Values below 1 are clamped to 1.
    pub fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files.max(1);
        self
    }

    /// Maximum number of entries in the files list. Values below 1 are clamped to 1.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Resolve the base directory, using default if not set.
    fn resolve_base_dir(&self) -> PathBuf {
        self.base_dir.clone().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".csvdock")
        })
    }

    pub async fn build(self) -> Result<CsvEngine> {
        let base_dir = self.resolve_base_dir();

        let catalog: Arc<dyn CatalogManager> = match self.catalog {
            Some(c) => c,
            None => {
                std::fs::create_dir_all(&base_dir)?;
                let catalog_path = base_dir.join("catalog.db");
                Arc::new(
                    SqliteCatalogManager::new(
                        catalog_path
                            .to_str()
                            .ok_or_else(|| anyhow::anyhow!("Invalid catalog path"))?,
                    )
                    .await?,
                )
            }
        };

        let store: Arc<dyn FileStore> = match self.store {
            Some(s) => s,
            None => {
                let files_dir = base_dir.join("files");
                std::fs::create_dir_all(&files_dir)?;
                Arc::new(FilesystemStore::with_bucket(files_dir, self.bucket.clone()))
            }
        };

        catalog.run_migrations().await?;
        info!(
            max_files = self.max_files,
            capacity_policy = ?self.capacity_policy,
            "Engine initialized"
        );

        Ok(CsvEngine {
            store,
            catalog,
            bucket: self.bucket,
            capacity_policy: self.capacity_policy,
            max_files: self.max_files,
            page_size: self.page_size,
        })
    }
}
