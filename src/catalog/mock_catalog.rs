//! Mock catalog implementation for testing.
//!
//! Provides an in-memory implementation of `CatalogManager` that can be
//! configured to fail, so tests can exercise error handling without a real
//! database.

use super::{CatalogManager, FileRecord, MonthlyUploadCount};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Mock catalog that can be configured to fail for testing error handling.
#[derive(Debug, Default)]
pub struct MockCatalog {
    records: Mutex<Vec<FileRecord>>,
    counts: Mutex<BTreeMap<(i32, u32), u64>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a counter directly.
    pub fn set_monthly_count(&self, year: i32, month: u32, count: u64) {
        if let Ok(mut counts) = self.counts.lock() {
            counts.insert((year, month), count);
        }
    }

    /// Snapshot of every inserted file record.
    pub fn file_records(&self) -> Vec<FileRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Configure whether insert/increment operations should fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Configure whether list operations should fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("Simulated catalog write failure");
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogManager for MockCatalog {
    async fn run_migrations(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_file_record(&self, record: &FileRecord) -> Result<()> {
        self.check_writes()?;
        self.records
            .lock()
            .map_err(|_| anyhow!("mock catalog lock poisoned"))?
            .push(record.clone());
        Ok(())
    }

    async fn increment_monthly_count(&self, year: i32, month: u32) -> Result<u64> {
        self.check_writes()?;
        let mut counts = self
            .counts
            .lock()
            .map_err(|_| anyhow!("mock catalog lock poisoned"))?;
        let count = counts.entry((year, month)).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn list_monthly_counts(&self) -> Result<Vec<MonthlyUploadCount>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("Simulated catalog read failure");
        }
        let counts = self
            .counts
            .lock()
            .map_err(|_| anyhow!("mock catalog lock poisoned"))?;
        Ok(counts
            .iter()
            .map(|(&(year, month), &count)| MonthlyUploadCount { year, month, count })
            .collect())
    }
}
