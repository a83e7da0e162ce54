use crate::files::FileStats;
use crate::parser::ProjectedRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Request body for POST /get-file-headers and POST /get-file-rows
#[derive(Debug, Deserialize)]
pub struct FileRequest {
    pub file_id: String,
    /// 1-based row holding the headers. Defaults to the first row.
    #[serde(default)]
    pub header_row: Option<usize>,
}

/// Request body for POST /get-file-data
#[derive(Debug, Deserialize)]
pub struct FileDataRequest {
    pub file_id: String,
    #[serde(default)]
    pub header_row: Option<usize>,
    pub headers: Vec<String>,
}

/// Response body for POST /upload-file
#[derive(Debug, Serialize)]
pub struct UploadFileResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "fileId")]
    pub file_id: String,
    pub headers: Vec<String>,
}

/// Response body for POST /get-file-headers and POST /get-file-data
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

/// Response body for POST /get-file-rows
#[derive(Debug, Serialize)]
pub struct FileRowsResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "rowsParsed")]
    pub rows_parsed: usize,
    pub data: Vec<ProjectedRow>,
}

/// Single entry of the files list
#[derive(Debug, Serialize)]
pub struct FileInfo {
    pub file_id: String,
    pub file_name: String,
    pub uploaded_at: NaiveDate,
}

/// Response body for GET /get-files-list
#[derive(Debug, Serialize)]
pub struct FilesListResponse {
    pub success: bool,
    pub total_files: usize,
    pub files: Vec<FileInfo>,
}

/// Response body for GET /get-files-stat
#[derive(Debug, Serialize)]
pub struct FilesStatResponse {
    pub success: bool,
    pub message: String,
    pub stats: FileStats,
}
