//! HTTP surface tests: the router driven in-process with `oneshot`.

mod helpers;

use autoscreen_lib::commands::router;
use autoscreen_lib::sink::SinkKind;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

fn app(dir: &std::path::Path) -> Router {
    let (session, _keys) = helpers::controller(dir, false);
    router(Arc::new(session))
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

#[tokio::test]
async fn home_page_reports_mode_off() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path()).oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Screenshot mode is OFF"));
    assert!(html.contains("No file yet."));
}

#[tokio::test]
async fn new_file_renders_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(form_post("/new_file", "file_name=report&file_format=Excel"))
        .await
        .unwrap();

    let html = body_text(response).await;
    assert!(html.contains("New file &quot;report.xlsx&quot; created."));
    assert!(html.contains("color: green"));
    assert!(dir.path().join("report.xlsx").exists());
}

#[tokio::test]
async fn blank_name_renders_red_message() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(form_post("/new_file", "file_name=++&file_format=Word"))
        .await
        .unwrap();

    let html = body_text(response).await;
    assert!(html.contains("Invalid file name."));
    assert!(html.contains("color: red"));
}

#[tokio::test]
async fn unknown_format_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(form_post("/new_file", "file_name=report&file_format=PDF"))
        .await
        .unwrap();

    let html = body_text(response).await;
    assert!(html.contains("Unknown file format"));
    assert!(!dir.path().join("report.pdf").exists());
}

#[tokio::test]
async fn download_without_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path()).oneshot(get("/download")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "No file available for download.");
}

#[tokio::test]
async fn created_document_is_downloadable() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    app.clone()
        .oneshot(form_post("/new_file", "file_name=notes&file_format=Word"))
        .await
        .unwrap();
    let response = app.oneshot(get("/download")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(
        headers[header::CONTENT_TYPE],
        SinkKind::Document.content_type()
    );
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"notes.docx\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    // .docx is a zip archive.
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn screenshot_on_and_off_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let on = app
        .clone()
        .oneshot(form_post("/screenshot_on", "file_name=demo"))
        .await
        .unwrap();
    assert!(body_text(on).await.contains("Screenshot mode ON."));

    let status = app.clone().oneshot(get("/status")).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_text(status).await).unwrap();
    assert_eq!(json["capture_enabled"], true);
    assert_eq!(json["file_name"], "demo.xlsx");
    assert_eq!(json["sink_kind"], "Spreadsheet");

    let again = app
        .clone()
        .oneshot(form_post("/screenshot_on", "file_name=demo"))
        .await
        .unwrap();
    assert!(body_text(again).await.contains("Screenshot mode is already ON."));

    let off = app
        .clone()
        .oneshot(form_post("/screenshot_off", ""))
        .await
        .unwrap();
    assert!(body_text(off).await.contains("Screenshot mode OFF"));

    let status = app.oneshot(get("/status")).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_text(status).await).unwrap();
    assert_eq!(json["capture_enabled"], false);
}
