mod appwrite_manager;
mod manager;
mod migrations;
pub mod mock_catalog;
mod sqlite_manager;

pub use appwrite_manager::AppwriteCatalogManager;
pub use manager::{CatalogManager, FileRecord, MonthlyUploadCount};
pub use mock_catalog::MockCatalog;
pub use sqlite_manager::SqliteCatalogManager;
