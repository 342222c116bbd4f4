use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use docx_api::{API_KEY_HEADER, ApiServerConfig, router};
use docx_core::control::DocxControlPlane;
use docx_core::store::{BlobStore, SurrealDocStore};
use serde_json::{Value, json};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tempfile::TempDir;
use tower::ServiceExt;

async fn build_control_plane(db_name: &str) -> (DocxControlPlane<Db>, TempDir) {
    let db = Surreal::new::<Mem>(())
        .await
        .expect("failed to create in-memory surrealdb instance");
    db.use_ns("docx")
        .use_db(db_name)
        .await
        .expect("failed to select surrealdb namespace/db");
    let dir = tempfile::tempdir().expect("failed to create blob directory");
    let blobs = BlobStore::open(dir.path())
        .await
        .expect("failed to open blob store");
    (DocxControlPlane::new(SurrealDocStore::new(db), blobs), dir)
}

async fn build_app(db_name: &str) -> (Router, TempDir) {
    let (control, dir) = build_control_plane(db_name).await;
    (router(control, &ApiServerConfig::default()), dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");
    let (status, bytes) = send(app, request).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

async fn create_document(app: &Router, title: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/v1/documents",
        Some(json!({ "title": title, "owner": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["document_id"]
        .as_str()
        .expect("created document should carry an id")
        .to_string()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _dir) = build_app("api_health").await;
    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn documents_are_created_fetched_and_deleted() {
    let (app, _dir) = build_app("api_documents").await;
    let document_id = create_document(&app, "Field Notes").await;

    let (status, body) =
        send_json(&app, "GET", &format!("/api/v1/documents/{document_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Field Notes");
    assert_eq!(body["status"], "draft");

    let (status, body) = send_json(&app, "GET", "/api/v1/documents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, _) =
        send_json(&app, "DELETE", &format!("/api/v1/documents/{document_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) =
        send_json(&app, "GET", &format!("/api/v1/documents/{document_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(
        body["error"].as_str().is_some_and(|message| message.contains(&document_id)),
        "{body}"
    );
}

#[tokio::test]
async fn paragraphs_are_edited_through_the_api() {
    let (app, _dir) = build_app("api_paragraphs").await;
    let document_id = create_document(&app, "Minutes").await;
    let base = format!("/api/v1/documents/{document_id}");

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("{base}/paragraphs"),
        Some(json!({ "text": "Hello world" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["index"], 0);

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("{base}/text/replace"),
        Some(json!({ "find": "world", "replace": "team" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["replacements"], 1);

    let (status, body) = send_json(&app, "GET", &format!("{base}/text"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Hello team");

    let (status, body) =
        send_json(&app, "GET", &format!("{base}/paragraphs/7"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (app, _dir) = build_app("api_malformed").await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/documents")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\":"))
        .expect("failed to build request");
    let (status, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).expect("error body should be JSON");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn api_key_guards_api_routes_but_not_health() {
    let (control, _dir) = build_control_plane("api_key").await;
    let config = ApiServerConfig::default().with_api_key(Some("s3cret".to_string()));
    let app = router(control, &config);

    let (status, body) = send_json(&app, "GET", "/api/v1/documents", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send_json(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .uri("/api/v1/documents")
        .header(API_KEY_HEADER, "s3cret")
        .body(Body::empty())
        .expect("failed to build request");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn content_and_exports_are_downloadable() {
    let (app, _dir) = build_app("api_exports").await;
    let document_id = create_document(&app, "Release Notes").await;
    let base = format!("/api/v1/documents/{document_id}");
    send_json(
        &app,
        "POST",
        &format!("{base}/headings"),
        Some(json!({ "text": "Overview", "level": 1 })),
    )
    .await;

    let request = Request::builder()
        .uri(format!("{base}/content"))
        .body(Body::empty())
        .expect("failed to build request");
    let (status, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"PK"));

    let (status, body) =
        send_json(&app, "GET", &format!("{base}/export?format=markdown"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body.as_str().is_some_and(|text| text.contains("# Overview")),
        "{body}"
    );

    let (status, body) =
        send_json(&app, "GET", &format!("{base}/export?format=pdf"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = send_json(&app, "GET", "/api/v1/export/formats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn background_exports_need_a_running_queue() {
    let (app, _dir) = build_app("api_no_queue").await;
    let document_id = create_document(&app, "Queued").await;
    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/v1/documents/{document_id}/exports"),
        Some(json!({ "format": "html" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{body}");
}

#[tokio::test]
async fn comments_and_versions_round_through_review_routes() {
    let (app, _dir) = build_app("api_review").await;
    let document_id = create_document(&app, "Policy").await;
    let base = format!("/api/v1/documents/{document_id}");
    send_json(
        &app,
        "POST",
        &format!("{base}/paragraphs"),
        Some(json!({ "text": "Remote work is allowed." })),
    )
    .await;

    let (status, comment) = send_json(
        &app,
        "POST",
        &format!("{base}/comments"),
        Some(json!({ "paragraph_index": 0, "author": "bob", "content": "Clarify scope" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{comment}");
    let comment_id = comment["comment_id"].as_str().expect("comment id");

    let (status, resolved) = send_json(
        &app,
        "POST",
        &format!("{base}/comments/{comment_id}/resolve"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "resolved");

    let (status, open) =
        send_json(&app, "GET", &format!("{base}/comments?status=open"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(open.as_array().map(Vec::len), Some(0));

    let (status, version) = send_json(
        &app,
        "POST",
        &format!("{base}/versions"),
        Some(json!({ "change_summary": "first review" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{version}");
    let number = version["version_number"].as_u64().expect("version number");

    let (status, body) =
        send_json(&app, "DELETE", &format!("{base}/versions/{number}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[tokio::test]
async fn timed_out_edits_leave_cache_and_storage_in_step() {
    let (control, _dir) = build_control_plane("api_timeout").await;
    let patient = router(control.clone(), &ApiServerConfig::default());
    let hasty = router(
        control,
        &ApiServerConfig::default().with_request_timeout(Duration::ZERO),
    );
    let document_id = create_document(&patient, "Deadline").await;
    let base = format!("/api/v1/documents/{document_id}");
    let (status, _) = send_json(
        &patient,
        "POST",
        &format!("{base}/paragraphs"),
        Some(json!({ "text": "first" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        &hasty,
        "POST",
        &format!("{base}/paragraphs"),
        Some(json!({ "text": "second" })),
    )
    .await;
    assert!(
        status == StatusCode::CREATED || status == StatusCode::REQUEST_TIMEOUT,
        "{status} {body}"
    );

    let (_, cached) = send_json(&patient, "GET", &format!("{base}/text"), None).await;
    let (status, closed) = send_json(&patient, "POST", &format!("{base}/close"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["closed"], true);
    let (_, stored) = send_json(&patient, "GET", &format!("{base}/text"), None).await;
    assert_eq!(cached, stored);
}

#[tokio::test]
async fn batches_and_regex_replace_edit_in_one_call() {
    let (app, _dir) = build_app("api_batch").await;
    let document_id = create_document(&app, "Batch").await;
    let base = format!("/api/v1/documents/{document_id}");
    let operations = json!([
        { "operation": "add_paragraph", "params": { "text": "Call 555-0100" } },
        { "operation": "shred", "params": {} },
        { "operation": "add_page_break" },
    ]);

    let (status, validation) = send_json(
        &app,
        "POST",
        &format!("{base}/batch/validate"),
        Some(json!({ "operations": operations })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{validation}");
    assert_eq!(validation["valid"], false);
    assert_eq!(validation["results"][1]["error"], "Unknown operation: shred");

    let (status, outcome) = send_json(
        &app,
        "POST",
        &format!("{base}/batch"),
        Some(json!({ "operations": operations, "stop_on_error": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{outcome}");
    assert_eq!(outcome["saved"], false);
    let (_, paragraphs) = send_json(&app, "GET", &format!("{base}/paragraphs"), None).await;
    assert_eq!(paragraphs.as_array().map(Vec::len), Some(0));

    let (status, outcome) = send_json(
        &app,
        "POST",
        &format!("{base}/batch"),
        Some(json!({ "operations": operations })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{outcome}");
    assert_eq!(outcome["saved"], true);
    assert_eq!(outcome["results"].as_array().map(Vec::len), Some(2));

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("{base}/text/regex-replace"),
        Some(json!({ "pattern": r"(\d{3})-(\d{4})", "replacement": "($1) $2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["replacements"], 1);
    let (_, body) = send_json(&app, "GET", &format!("{base}/paragraphs/0"), None).await;
    assert_eq!(body["text"], "Call (555) 0100");

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("{base}/text/regex-replace"),
        Some(json!({ "pattern": "(", "replacement": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
