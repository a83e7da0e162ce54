use crate::appwrite::DEFAULT_ENDPOINT;
use crate::files::{CapacityPolicy, DEFAULT_MAX_FILES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub appwrite: AppwriteConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Connection to the Appwrite project, shared by storage and catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppwriteConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub project_id: Option<String>,
    pub api_key: Option<String>,
}

impl Default for AppwriteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project_id: None,
            api_key: None,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(rename = "type", default = "default_storage_type")]
    pub storage_type: String,
    pub bucket_id: Option<String>,
    /// Files kept in the bucket before the capacity policy kicks in.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default)]
    pub capacity_policy: CapacityPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: default_storage_type(),
            bucket_id: None,
            max_files: default_max_files(),
            capacity_policy: CapacityPolicy::default(),
        }
    }
}

fn default_storage_type() -> String {
    "filesystem".to_string()
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(rename = "type", default = "default_catalog_type")]
    pub catalog_type: String,
    pub database_id: Option<String>,
    pub files_collection_id: Option<String>,
    pub counts_collection_id: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_type: default_catalog_type(),
            database_id: None,
            files_collection_id: None,
            counts_collection_id: None,
        }
    }
}

fn default_catalog_type() -> String {
    "sqlite".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PathsConfig {
    /// Base directory for local data (catalog.db, files/).
    /// Defaults to ~/.csvdock
    pub base_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListingConfig {
    /// Maximum number of files returned by the files list.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    150
}

impl AppConfig {
    /// Load configuration from an optional file and environment variables
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Add environment variables with prefix CSVDOCK_
        // Example: CSVDOCK_STORAGE__MAX_FILES=200
        builder = builder.add_source(
            config::Environment::with_prefix("CSVDOCK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let needs_appwrite =
            self.storage.storage_type == "appwrite" || self.catalog.catalog_type == "appwrite";
        if needs_appwrite {
            if self.appwrite.project_id.is_none() {
                anyhow::bail!("Appwrite backend requires 'appwrite.project_id'");
            }
            if self.appwrite.api_key.is_none() {
                anyhow::bail!("Appwrite backend requires 'appwrite.api_key'");
            }
        }

        // Validate storage config
        match self.storage.storage_type.as_str() {
            "appwrite" => {
                if self.storage.bucket_id.is_none() {
                    anyhow::bail!("Appwrite storage requires 'bucket_id'");
                }
            }
            "filesystem" => {
                // Filesystem storage uses paths config, no additional validation needed
            }
            _ => anyhow::bail!("Invalid storage type: {}", self.storage.storage_type),
        }

        if self.storage.max_files == 0 {
            anyhow::bail!("'storage.max_files' must be at least 1");
        }

        // Validate catalog config
        match self.catalog.catalog_type.as_str() {
            "appwrite" => {
                if self.catalog.database_id.is_none() {
                    anyhow::bail!("Appwrite catalog requires 'database_id'");
                }
                if self.catalog.files_collection_id.is_none() {
                    anyhow::bail!("Appwrite catalog requires 'files_collection_id'");
                }
                if self.catalog.counts_collection_id.is_none() {
                    anyhow::bail!("Appwrite catalog requires 'counts_collection_id'");
                }
            }
            "sqlite" => {
                // SQLite uses paths config, no additional validation needed
            }
            _ => anyhow::bail!("Invalid catalog type: {}", self.catalog.catalog_type),
        }

        if self.listing.page_size == 0 {
            anyhow::bail!("'listing.page_size' must be at least 1");
        }

        Ok(())
    }
}
