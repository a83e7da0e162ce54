use crate::http::error::ApiError;
use crate::http::models::FilesStatResponse;
use crate::CsvEngine;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Handler for GET /get-files-stat
pub async fn get_files_stat(
    State(engine): State<Arc<CsvEngine>>,
) -> Result<Json<FilesStatResponse>, ApiError> {
    let stats = engine.file_stats().await?;

    Ok(Json(FilesStatResponse {
        success: true,
        message: "file stats received".to_string(),
        stats,
    }))
}
