use crate::catalog::manager::{CatalogManager, FileRecord, MonthlyUploadCount};
use crate::catalog::migrations::{run_migrations, CatalogMigrations};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::fmt::{self, Debug, Formatter};

/// Catalog stored in a local SQLite database.
///
/// Counter increments are a single upsert statement, so concurrent uploads in
/// the same month never lose an increment.
pub struct SqliteCatalogManager {
    pool: SqlitePool,
    catalog_path: String,
}

impl Debug for SqliteCatalogManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCatalogManager")
            .field("catalog_path", &self.catalog_path)
            .finish()
    }
}

struct SqliteMigrationBackend;

impl SqliteCatalogManager {
    pub async fn new(db_path: &str) -> Result<Self> {
        let uri = format!("sqlite:{}?mode=rwc", db_path);
        let pool = SqlitePool::connect(&uri).await?;

        Ok(Self {
            pool,
            catalog_path: db_path.to_string(),
        })
    }

    /// In-memory catalog, mostly useful in tests.
    pub async fn in_memory() -> Result<Self> {
        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self {
            pool,
            catalog_path: ":memory:".to_string(),
        })
    }

    async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS file_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                uploaded_at TEXT NOT NULL
            )
        "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS monthly_upload_counts (
                year INTEGER NOT NULL,
                month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
                count INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0),
                PRIMARY KEY (year, month)
            )
        "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// File records, newest first.
    pub async fn list_file_records(&self, limit: usize) -> Result<Vec<FileRecord>> {
        let rows: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT filename, uploaded_at FROM file_records ORDER BY uploaded_at DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(filename, uploaded_at)| FileRecord {
                filename,
                uploaded_at,
            })
            .collect())
    }
}

#[async_trait]
impl CatalogManager for SqliteCatalogManager {
    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    async fn run_migrations(&self) -> Result<()> {
        run_migrations::<SqliteMigrationBackend>(&self.pool).await
    }

    async fn insert_file_record(&self, record: &FileRecord) -> Result<()> {
        sqlx::query("INSERT INTO file_records (filename, uploaded_at) VALUES (?, ?)")
            .bind(&record.filename)
            .bind(record.uploaded_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_monthly_count(&self, year: i32, month: u32) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO monthly_upload_counts (year, month, count) VALUES (?, ?, 1)
            ON CONFLICT (year, month) DO UPDATE SET count = count + 1
            RETURNING count
        "#,
        )
        .bind(year)
        .bind(month)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn list_monthly_counts(&self) -> Result<Vec<MonthlyUploadCount>> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            "SELECT year, month, count FROM monthly_upload_counts ORDER BY year, month",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(year, month, count)| MonthlyUploadCount {
                year: year as i32,
                month: month as u32,
                count: count.max(0) as u64,
            })
            .collect())
    }
}

impl CatalogMigrations for SqliteMigrationBackend {
    type Pool = SqlitePool;

    fn ensure_migrations_table(pool: &Self::Pool) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS schema_migrations (
                    version INTEGER PRIMARY KEY,
                    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )
                "#,
            )
            .execute(pool)
            .await?;
            Ok(())
        })
    }

    fn current_version(pool: &Self::Pool) -> BoxFuture<'_, Result<i64>> {
        Box::pin(async move {
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(pool)
                .await
                .map_err(Into::into)
        })
    }

    fn record_version(pool: &Self::Pool, version: i64) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
                .bind(version)
                .execute(pool)
                .await?;
            Ok(())
        })
    }

    fn migrate_v1(pool: &Self::Pool) -> BoxFuture<'_, Result<()>> {
        Box::pin(SqliteCatalogManager::initialize_schema(pool))
    }
}
