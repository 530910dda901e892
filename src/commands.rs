//! HTTP command handlers.
//!
//! These are thin wrappers that bridge the control page to the session.
//! Each handler does one thing, runs the (blocking) session call on the
//! blocking pool, and turns the outcome into a page or a file.

use crate::page::{render_page, Banner};
use crate::session::{SessionController, SessionError};
use crate::sink::SinkKind;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub type SharedSession = Arc<SessionController>;

pub fn router(session: SharedSession) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/new_file", post(new_file))
        .route("/screenshot_on", post(screenshot_on))
        .route("/screenshot_off", post(screenshot_off))
        .route("/download", get(download))
        .route("/status", get(status))
        .with_state(session)
}

#[derive(Debug, Deserialize)]
pub struct NewFileForm {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_format: String,
}

#[derive(Debug, Deserialize)]
pub struct ScreenshotOnForm {
    #[serde(default)]
    pub file_name: String,
}

/// Run a session call off the async runtime. `disable_capture` joins a
/// thread and the sinks do file I/O, so none of this may block a worker.
async fn blocking<T, F>(session: &SharedSession, call: F) -> Result<T, SessionError>
where
    T: Send + 'static,
    F: FnOnce(&SessionController) -> Result<T, SessionError> + Send + 'static,
{
    let session = Arc::clone(session);
    tokio::task::spawn_blocking(move || call(&session))
        .await
        .map_err(|e| SessionError::OperationFailed(e.to_string()))?
}

/// Render the page after an action, green on success and red on error.
async fn respond(session: &SharedSession, outcome: Result<String, SessionError>) -> Html<String> {
    let banner = match outcome {
        Ok(message) => Banner::ok(message),
        Err(e) => {
            log::warn!("[WEB] {}", e);
            Banner::error(e.to_string())
        }
    };
    let status = blocking(session, |s| s.status()).await.ok();
    Html(render_page(&banner, status.as_ref()))
}

/// GET /: the control page.
async fn home(State(session): State<SharedSession>) -> Html<String> {
    let status = blocking(&session, |s| s.status()).await.ok();
    let enabled = status.as_ref().is_some_and(|s| s.capture_enabled);
    let banner = Banner::ok(if enabled {
        "Screenshot mode is ON"
    } else {
        "Screenshot mode is OFF"
    });
    Html(render_page(&banner, status.as_ref()))
}

/// POST /new_file: start a fresh Word or Excel file.
async fn new_file(
    State(session): State<SharedSession>,
    Form(form): Form<NewFileForm>,
) -> Html<String> {
    log::debug!(
        "[WEB] New file request: name={:?} format={:?}",
        form.file_name,
        form.file_format
    );
    let outcome = match SinkKind::from_form_value(&form.file_format) {
        Some(kind) => {
            let name = form.file_name;
            blocking(&session, move |s| s.create_file(&name, kind)).await
        }
        None => Err(SessionError::OperationFailed(format!(
            "Unknown file format {:?}",
            form.file_format
        ))),
    };
    respond(&session, outcome).await
}

/// POST /screenshot_on: start listening for the trigger key.
async fn screenshot_on(
    State(session): State<SharedSession>,
    Form(form): Form<ScreenshotOnForm>,
) -> Html<String> {
    let name = form.file_name;
    let outcome = blocking(&session, move |s| s.enable_capture(&name)).await;
    respond(&session, outcome).await
}

/// POST /screenshot_off: stop listening. Returns once the poller is gone.
async fn screenshot_off(State(session): State<SharedSession>) -> Html<String> {
    let outcome = blocking(&session, |s| s.disable_capture()).await;
    respond(&session, outcome).await
}

/// GET /download: the current file as an attachment.
async fn download(State(session): State<SharedSession>) -> Response {
    match blocking(&session, |s| s.download()).await {
        Ok(file) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                file.filename.replace('"', "_")
            );
            (
                [
                    (header::CONTENT_TYPE, file.content_type.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                file.bytes,
            )
                .into_response()
        }
        Err(e @ SessionError::NoFileAvailable) => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e) => {
            log::error!("[WEB] Download failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// GET /status: session snapshot as JSON.
async fn status(State(session): State<SharedSession>) -> Response {
    match blocking(&session, |s| s.status()).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
