pub mod appwrite;
pub mod catalog;
pub mod config;
mod engine;
pub mod files;
pub mod http;
pub mod id;
pub mod parser;
pub mod storage;
pub mod telemetry;

pub use engine::{
    CsvEngine, CsvEngineBuilder, CsvUpload, FileSummary, IngestedFile, DEFAULT_PAGE_SIZE,
};
