use crate::http::controllers::{
    get_file_data, get_file_headers, get_file_rows, get_files_list, get_files_stat,
    health_handler, index_handler, upload_file,
};
use crate::http::error::{ApiError, INTERNAL_ERROR_MESSAGE};
use crate::storage::MAX_FILE_SIZE;
use crate::CsvEngine;
use axum::extract::DefaultBodyLimit;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};

pub struct AppServer {
    pub router: Router,
    pub engine: Arc<CsvEngine>,
}

pub const PATH_INDEX: &str = "/";
pub const PATH_HEALTH: &str = "/health";
pub const PATH_UPLOAD_FILE: &str = "/upload-file";
pub const PATH_FILE_HEADERS: &str = "/get-file-headers";
pub const PATH_FILE_DATA: &str = "/get-file-data";
pub const PATH_FILE_ROWS: &str = "/get-file-rows";
pub const PATH_FILES_LIST: &str = "/get-files-list";
pub const PATH_FILES_STAT: &str = "/get-files-stat";

/// Prefix under which every file route is mounted a second time.
pub const API_V2_PREFIX: &str = "/api/v2";

/// Room left for multipart boundaries and part headers on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

impl AppServer {
    pub fn new(engine: CsvEngine) -> Self {
        let engine = Arc::new(engine);
        AppServer {
            router: Router::new()
                .route(PATH_INDEX, get(index_handler))
                .route(PATH_HEALTH, get(health_handler))
                .merge(file_routes())
                .nest(API_V2_PREFIX, file_routes())
                .fallback(not_found_handler)
                .layer(DefaultBodyLimit::max(MAX_FILE_SIZE as usize + MULTIPART_OVERHEAD))
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(
                    CorsLayer::new()
                        .allow_origin(cors::Any)
                        .allow_methods(cors::Any)
                        .allow_headers(cors::Any),
                )
                .with_state(engine.clone()),
            engine,
        }
    }
}

fn file_routes() -> Router<Arc<CsvEngine>> {
    Router::new()
        .route(PATH_UPLOAD_FILE, post(upload_file))
        .route(PATH_FILE_HEADERS, post(get_file_headers))
        .route(PATH_FILE_DATA, post(get_file_data))
        .route(PATH_FILE_ROWS, post(get_file_rows))
        .route(PATH_FILES_LIST, get(get_files_list))
        .route(PATH_FILES_STAT, get(get_files_stat))
}

async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route '{}' not found", uri.path()))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");

    ApiError::internal_error(INTERNAL_ERROR_MESSAGE).into_response()
}
