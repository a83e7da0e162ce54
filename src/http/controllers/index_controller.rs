use crate::http::app_server::{
    PATH_FILES_LIST, PATH_FILES_STAT, PATH_FILE_DATA, PATH_FILE_HEADERS, PATH_FILE_ROWS,
    PATH_HEALTH, PATH_UPLOAD_FILE,
};
use axum::Json;
use std::collections::BTreeMap;

/// Handler for GET / - lists the available endpoints.
pub async fn index_handler() -> Json<BTreeMap<String, &'static str>> {
    let routes = [
        ("GET", PATH_HEALTH, "Service health"),
        (
            "POST",
            PATH_UPLOAD_FILE,
            "Upload a CSV file in the multipart field 'csvfile'",
        ),
        (
            "POST",
            PATH_FILE_HEADERS,
            "Headers of a file: {file_id, header_row?}",
        ),
        (
            "POST",
            PATH_FILE_DATA,
            "Rows of a file projected on headers: {file_id, header_row?, headers}",
        ),
        (
            "POST",
            PATH_FILE_ROWS,
            "Rows of a file keyed by every header: {file_id, header_row?}",
        ),
        ("GET", PATH_FILES_LIST, "Most recently uploaded files"),
        ("GET", PATH_FILES_STAT, "Upload counts per year and month"),
    ];

    Json(
        routes
            .into_iter()
            .map(|(method, path, description)| (format!("{}: {}", method, path), description))
            .collect(),
    )
}
