use crate::http::error::ApiError;
use crate::http::models::{
    DataResponse, FileDataRequest, FileInfo, FileRequest, FileRowsResponse, FilesListResponse,
    UploadFileResponse,
};
use crate::parser::{ProjectedRow, DEFAULT_HEADER_ROW};
use crate::{CsvEngine, CsvUpload};
use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "csvfile";

/// Handler for POST /upload-file
#[tracing::instrument(
    name = "handler_upload_file",
    skip(engine, multipart),
    fields(csvdock.file_id = tracing::field::Empty)
)]
pub async fn upload_file(
    State(engine): State<Arc<CsvEngine>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadFileResponse>), ApiError> {
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        upload = Some(CsvUpload {
            name,
            mime_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let file = engine.ingest(upload).await?;

    tracing::Span::current().record("csvdock.file_id", file.id.as_str());

    Ok((
        StatusCode::CREATED,
        Json(UploadFileResponse {
            success: true,
            message: "File uploaded successfully".to_string(),
            file_id: file.id,
            headers: file.headers,
        }),
    ))
}

/// Handler for POST /get-file-headers
#[tracing::instrument(name = "handler_get_file_headers", skip(engine, payload))]
pub async fn get_file_headers(
    State(engine): State<Arc<CsvEngine>>,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Vec<String>>>, ApiError> {
    let Json(request) = payload?;
    let headers = engine
        .file_headers(
            &request.file_id,
            request.header_row.unwrap_or(DEFAULT_HEADER_ROW),
        )
        .await?;

    Ok(Json(DataResponse {
        success: true,
        message: "File headers received successfully".to_string(),
        data: headers,
    }))
}

/// Handler for POST /get-file-data
#[tracing::instrument(
    name = "handler_get_file_data",
    skip(engine, payload),
    fields(csvdock.row_count = tracing::field::Empty)
)]
pub async fn get_file_data(
    State(engine): State<Arc<CsvEngine>>,
    payload: Result<Json<FileDataRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Vec<ProjectedRow>>>, ApiError> {
    let Json(request) = payload?;
    if request.headers.is_empty() {
        return Err(ApiError::bad_request("At least 1 header is required"));
    }

    let rows = engine
        .file_data(
            &request.file_id,
            request.header_row.unwrap_or(DEFAULT_HEADER_ROW),
            &request.headers,
        )
        .await?;

    tracing::Span::current().record("csvdock.row_count", rows.len());

    Ok(Json(DataResponse {
        success: true,
        message: "File parsed successfully".to_string(),
        data: rows,
    }))
}

/// Handler for POST /get-file-rows
#[tracing::instrument(name = "handler_get_file_rows", skip(engine, payload))]
pub async fn get_file_rows(
    State(engine): State<Arc<CsvEngine>>,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> Result<Json<FileRowsResponse>, ApiError> {
    let Json(request) = payload?;
    let rows = engine
        .file_rows(
            &request.file_id,
            request.header_row.unwrap_or(DEFAULT_HEADER_ROW),
        )
        .await?;

    Ok(Json(FileRowsResponse {
        success: true,
        message: "CSV file parsed".to_string(),
        rows_parsed: rows.len(),
        data: rows,
    }))
}

/// Handler for GET /get-files-list
#[tracing::instrument(
    name = "handler_get_files_list",
    skip(engine),
    fields(csvdock.file_count = tracing::field::Empty)
)]
pub async fn get_files_list(
    State(engine): State<Arc<CsvEngine>>,
) -> Result<Json<FilesListResponse>, ApiError> {
    let files = engine.list_files().await?;

    tracing::Span::current().record("csvdock.file_count", files.len());

    Ok(Json(FilesListResponse {
        success: true,
        total_files: files.len(),
        files: files
            .into_iter()
            .map(|f| FileInfo {
                file_id: f.id,
                file_name: f.name,
                uploaded_at: f.uploaded_at,
            })
            .collect(),
    }))
}
