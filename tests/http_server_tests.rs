use anyhow::Result;
use axum::response::Response;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Datelike, Utc};
use csvdock::catalog::MockCatalog;
use csvdock::http::app_server::{
    AppServer, API_V2_PREFIX, PATH_FILES_LIST, PATH_FILES_STAT, PATH_FILE_DATA,
    PATH_FILE_HEADERS, PATH_FILE_ROWS, PATH_HEALTH, PATH_INDEX, PATH_UPLOAD_FILE,
};
use csvdock::CsvEngine;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const BOUNDARY: &str = "csvdock-test-boundary";
const SAMPLE_CSV: &str = "a,b,c\r\n1,2,3\r\n4,5,6";

/// Create test router backed by a temp directory
async fn setup_test() -> Result<(Router, TempDir)> {
    let temp_dir = tempfile::tempdir()?;
    let engine = CsvEngine::defaults(temp_dir.path()).await?;
    let app = AppServer::new(engine);
    Ok((app.router, temp_dir))
}

/// Create test router whose catalog can be told to fail
async fn setup_test_with_mock() -> Result<(Router, Arc<MockCatalog>, TempDir)> {
    let temp_dir = tempfile::tempdir()?;
    let catalog = Arc::new(MockCatalog::new());
    let engine = CsvEngine::builder()
        .base_dir(temp_dir.path())
        .catalog(catalog.clone())
        .build()
        .await?;
    let app = AppServer::new(engine);
    Ok((app.router, catalog, temp_dir))
}

fn multipart_body(field: &str, file_name: &str, content_type: &str, content: &str) -> String {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n{content}\r\n--{b}--\r\n",
        b = BOUNDARY,
    )
}

async fn send_upload(
    router: &Router,
    path: &str,
    file_name: &str,
    content_type: &str,
    content: &str,
) -> Result<Response> {
    Ok(router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(
                    "csvfile",
                    file_name,
                    content_type,
                    content,
                )))?,
        )
        .await?)
}

async fn send_json(router: &Router, path: &str, body: Value) -> Result<Response> {
    Ok(router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body)?))?,
        )
        .await?)
}

async fn send_get(router: &Router, path: &str) -> Result<Response> {
    Ok(router
        .clone()
        .oneshot(Request::builder().method("GET").uri(path).body(Body::empty())?)
        .await?)
}

async fn body_json(response: Response) -> Result<Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Upload SAMPLE_CSV as data.csv and return its file id.
async fn upload_sample(router: &Router) -> Result<String> {
    let response = send_upload(router, PATH_UPLOAD_FILE, "data.csv", "text/csv", SAMPLE_CSV).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await?;
    Ok(json["fileId"].as_str().unwrap().to_string())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_endpoint() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let response = send_get(&router, PATH_HEALTH).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert_eq!(json, json!({"status": "ok", "service": "csvdock"}));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_index_lists_routes() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let response = send_get(&router, PATH_INDEX).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert!(json["POST: /upload-file"].is_string());
    assert!(json["GET: /get-files-stat"].is_string());

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_returns_id_and_headers() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let response =
        send_upload(&router, PATH_UPLOAD_FILE, "data.csv", "text/csv", SAMPLE_CSV).await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await?;
    assert_eq!(json["success"], true);
    assert_eq!(json["headers"], json!(["a", "b", "c"]));
    assert!(json["fileId"].as_str().unwrap().starts_with("file"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_then_project_columns() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let file_id = upload_sample(&router).await?;

    let response = send_json(
        &router,
        PATH_FILE_DATA,
        json!({"file_id": file_id, "headers": ["a", "c"]}),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert_eq!(json["success"], true);
    assert_eq!(
        json["data"],
        json!([{"a": "1", "c": "3"}, {"a": "4", "c": "6"}])
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_headers_are_dropped() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let file_id = upload_sample(&router).await?;

    let response = send_json(
        &router,
        PATH_FILE_DATA,
        json!({"file_id": file_id, "headers": ["a", "z"]}),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert_eq!(json["data"], json!([{"a": "1"}, {"a": "4"}]));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_all_headers_absent_is_bad_request() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let file_id = upload_sample(&router).await?;

    let response = send_json(
        &router,
        PATH_FILE_DATA,
        json!({"file_id": file_id, "headers": ["x", "y"]}),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await?;
    assert_eq!(json["success"], false);
    assert_eq!(
        json["message"],
        "invalid headers. At least 1 valid header required"
    );
    assert!(json.get("data").is_none());

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_file_data_request_validation() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let file_id = upload_sample(&router).await?;

    let empty = send_json(
        &router,
        PATH_FILE_DATA,
        json!({"file_id": file_id, "headers": []}),
    )
    .await?;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let missing = send_json(&router, PATH_FILE_DATA, json!({"file_id": file_id})).await?;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let bad_id = send_json(
        &router,
        PATH_FILE_DATA,
        json!({"file_id": 12, "headers": ["a"]}),
    )
    .await?;
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
    let json = body_json(bad_id).await?;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "BAD_REQUEST");

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_json_is_bad_request() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(PATH_FILE_HEADERS)
                .header("content-type", "application/json")
                .body(Body::from("{not json"))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["success"], false);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_file_headers() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let file_id = upload_sample(&router).await?;

    let response = send_json(&router, PATH_FILE_HEADERS, json!({"file_id": file_id})).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert_eq!(json["data"], json!(["a", "b", "c"]));

    let response = send_json(
        &router,
        PATH_FILE_HEADERS,
        json!({"file_id": file_id, "header_row": 2}),
    )
    .await?;
    assert_eq!(body_json(response).await?["data"], json!(["1", "2", "3"]));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_header_row_out_of_range() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let file_id = upload_sample(&router).await?;

    let beyond = send_json(
        &router,
        PATH_FILE_HEADERS,
        json!({"file_id": file_id, "header_row": 10}),
    )
    .await?;
    assert_eq!(beyond.status(), StatusCode::NOT_FOUND);

    let zero = send_json(
        &router,
        PATH_FILE_HEADERS,
        json!({"file_id": file_id, "header_row": 0}),
    )
    .await?;
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_file_is_not_found() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let response = send_json(
        &router,
        PATH_FILE_HEADERS,
        json!({"file_id": "filedoesnotexist"}),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await?;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "NOT_FOUND");

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_file_rows_skip_mismatched_arity() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let response = send_upload(
        &router,
        PATH_UPLOAD_FILE,
        "ragged.csv",
        "text/csv",
        "id,name\r\n1,ann\r\n2\r\n3,bob,extra\r\n4,cy",
    )
    .await?;
    let file_id = body_json(response).await?["fileId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send_json(&router, PATH_FILE_ROWS, json!({"file_id": file_id})).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert_eq!(json["rowsParsed"], 2);
    assert_eq!(
        json["data"],
        json!([{"id": "1", "name": "ann"}, {"id": "4", "name": "cy"}])
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_rejects_invalid_format() -> Result<()> {
    let (router, _dir) = setup_test().await?;

    let wrong_extension =
        send_upload(&router, PATH_UPLOAD_FILE, "data.txt", "text/csv", SAMPLE_CSV).await?;
    assert_eq!(wrong_extension.status(), StatusCode::BAD_REQUEST);
    let json = body_json(wrong_extension).await?;
    assert_eq!(json["message"], "Invalid file format. Valid format: '.csv'");

    let wrong_mime = send_upload(
        &router,
        PATH_UPLOAD_FILE,
        "data.csv",
        "application/octet-stream",
        SAMPLE_CSV,
    )
    .await?;
    assert_eq!(wrong_mime.status(), StatusCode::BAD_REQUEST);

    let listed = body_json(send_get(&router, PATH_FILES_LIST).await?).await?;
    assert_eq!(listed["total_files"], 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_without_file_field() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(PATH_UPLOAD_FILE)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(
                    "other", "data.csv", "text/csv", SAMPLE_CSV,
                )))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["message"], "No file uploaded");

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_requires_multipart() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let response = send_json(&router, PATH_UPLOAD_FILE, json!({"csvfile": "a,b"})).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["success"], false);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_files_list_newest_first() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    for name in ["first.csv", "second.csv", "third.csv"] {
        let response = send_upload(&router, PATH_UPLOAD_FILE, name, "text/csv", SAMPLE_CSV).await?;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send_get(&router, PATH_FILES_LIST).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;

    assert_eq!(json["success"], true);
    assert_eq!(json["total_files"], 3);
    let names: Vec<_> = json["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["file_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["third.csv", "second.csv", "first.csv"]);
    assert_eq!(
        json["files"][0]["uploaded_at"],
        Utc::now().date_naive().to_string()
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_files_stat_counts_uploads() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    upload_sample(&router).await?;
    upload_sample(&router).await?;

    let response = send_get(&router, PATH_FILES_STAT).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;

    let now = Utc::now();
    let year = json["stats"][now.year().to_string()].as_array().unwrap();
    assert_eq!(year.len(), 12);
    assert_eq!(year[now.month0() as usize], 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_files_stat_from_seeded_counts() -> Result<()> {
    let (router, catalog, _dir) = setup_test_with_mock().await?;
    catalog.set_monthly_count(2024, 1, 5);
    catalog.set_monthly_count(2024, 3, 2);

    let json = body_json(send_get(&router, PATH_FILES_STAT).await?).await?;
    assert_eq!(
        json["stats"],
        json!({"2024": [5, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0]})
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_files_stat_backend_failure_is_generic() -> Result<()> {
    let (router, catalog, _dir) = setup_test_with_mock().await?;
    catalog.set_fail_reads(true);

    let response = send_get(&router, PATH_FILES_STAT).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await?;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Internal server error");

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_succeeds_when_catalog_write_fails() -> Result<()> {
    let (router, catalog, _dir) = setup_test_with_mock().await?;
    catalog.set_fail_writes(true);

    let file_id = upload_sample(&router).await?;
    let response = send_json(&router, PATH_FILE_HEADERS, json!({"file_id": file_id})).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(catalog.file_records().is_empty());

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_routes_mounted_under_api_v2() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let response = send_upload(
        &router,
        &format!("{}{}", API_V2_PREFIX, PATH_UPLOAD_FILE),
        "data.csv",
        "text/csv",
        SAMPLE_CSV,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let file_id = body_json(response).await?["fileId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send_json(
        &router,
        &format!("{}{}", API_V2_PREFIX, PATH_FILE_DATA),
        json!({"file_id": file_id, "headers": ["b"]}),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await?["data"],
        json!([{"b": "2"}, {"b": "5"}])
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_route_uses_envelope() -> Result<()> {
    let (router, _dir) = setup_test().await?;
    let response = send_get(&router, "/nope").await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await?;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "NOT_FOUND");

    Ok(())
}
