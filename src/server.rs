//! HTTP surface over the job controller.
//!
//! Thin adapters only: every handler parses a request, calls one controller
//! (or runner) operation and maps the result onto a status code. The error
//! taxonomy translates mechanically — `Busy` → 429, `InvalidInput` → 400,
//! `NotReady` → 404, anything I/O-shaped → 500 — via [`ApiError`]'s
//! `IntoResponse`.
//!
//! `/estimate` is stateless and never touches the controller; `/progress`
//! always succeeds with the latest snapshot; `/download` is destructive (the
//! controller resets to idle as part of handing out the bytes).

use crate::config::SliceParameters;
use crate::error::{JobError, SliceError};
use crate::format::PaperFormat;
use crate::job::{JobController, JobState, PdfInfo};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Uploads above this size are refused outright.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
struct AppState {
    controller: Arc<JobController>,
}

/// Build the application router.
pub fn router(controller: Arc<JobController>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/estimate", post(estimate))
        .route("/upload", post(upload))
        .route("/progress", get(progress))
        .route("/cancel", post(cancel))
        .route("/download", get(download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(AppState { controller })
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn progress(State(app): State<AppState>) -> Json<JobState> {
    Json(app.controller.snapshot())
}

async fn cancel(State(app): State<AppState>) -> Json<serde_json::Value> {
    app.controller.request_cancel();
    Json(json!({ "status": "ok" }))
}

async fn upload(
    State(app): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let form = read_form(&mut multipart).await?;
    app.controller.admit(&form.bytes, form.params).await?;
    Ok(Json(json!({ "status": "started" })))
}

async fn estimate(
    State(app): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let form = read_form(&mut multipart).await?;
    form.params.validate()?;
    if !form.bytes.starts_with(b"%PDF") {
        return Err(ApiError::bad_request("uploaded file is not a PDF"));
    }

    let size_mb = form.bytes.len() as f64 / (1024.0 * 1024.0);

    // The engine needs a filesystem path; give it a scratch copy that dies
    // with the blocking task.
    let runner = app.controller.runner();
    let bytes = form.bytes;
    let info: PdfInfo = tokio::task::spawn_blocking(move || -> Result<PdfInfo, ApiError> {
        let mut tmp = tempfile::NamedTempFile::new()
            .map_err(|e| ApiError::internal(format!("tempfile: {e}")))?;
        tmp.write_all(&bytes)
            .map_err(|e| ApiError::internal(format!("tempfile write: {e}")))?;
        tmp.flush()
            .map_err(|e| ApiError::internal(format!("tempfile flush: {e}")))?;
        runner.inspect(tmp.path()).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("estimate task failed: {e}")))??;

    debug!("estimate: {} page(s), {:.2} MB", info.page_count, size_mb);

    Ok(Json(json!({
        "pages": info.page_count,
        "size": format!("{:.2} MB", size_mb),
    })))
}

async fn download(State(app): State<AppState>) -> Result<Response, ApiError> {
    let bytes = app.controller.take_output().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"output.pdf\"",
            ),
        ],
        bytes,
    )
        .into_response())
}

// ── Multipart form ───────────────────────────────────────────────────────

struct UploadForm {
    bytes: axum::body::Bytes,
    params: SliceParameters,
}

/// Read the shared `/upload`-`/estimate` form: a `pdf` file plus optional
/// `overlap` (default 8), `dpi` (default 300) and `paper_format` (default
/// "A4", strict set — unknown names are rejected here, at the gate).
async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let mut pdf: Option<(String, axum::body::Bytes)> = None;
    let mut params = SliceParameters::default();

    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or("") {
            "pdf" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await?;
                pdf = Some((filename, bytes));
            }
            "overlap" => params.overlap_mm = parse_field(&field.text().await?, "overlap")?,
            "dpi" => params.dpi = parse_field(&field.text().await?, "dpi")?,
            "paper_format" => {
                let name = field.text().await?;
                params.format = name
                    .parse::<PaperFormat>()
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
            }
            other => debug!("ignoring unknown form field '{other}'"),
        }
    }

    let (filename, bytes) =
        pdf.ok_or_else(|| ApiError::bad_request("missing 'pdf' file field"))?;
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(ApiError::bad_request("file must have a .pdf extension"));
    }

    Ok(UploadForm { bytes, params })
}

fn parse_field<T: FromStr>(value: &str, name: &str) -> Result<T, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid value for '{name}': '{value}'")))
}

// ── Error mapping ────────────────────────────────────────────────────────

/// An HTTP-shaped error: a status code and a message for the JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        let status = match &err {
            JobError::Busy => StatusCode::TOO_MANY_REQUESTS,
            JobError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            JobError::NotReady => StatusCode::NOT_FOUND,
            JobError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<SliceError> for ApiError {
    fn from(err: SliceError) -> Self {
        let status = match &err {
            // A file the engine cannot open is the client's problem.
            SliceError::EmptySource | SliceError::Engine(_) => StatusCode::BAD_REQUEST,
            SliceError::Cancelled | SliceError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::bad_request(format!("malformed multipart body: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_accepts_padded_numbers() {
        assert_eq!(parse_field::<u32>(" 300 ", "dpi").unwrap(), 300);
        assert_eq!(parse_field::<f64>("8.5", "overlap").unwrap(), 8.5);
    }

    #[test]
    fn parse_field_rejects_garbage() {
        assert!(parse_field::<u32>("many", "dpi").is_err());
        assert!(parse_field::<f64>("", "overlap").is_err());
    }

    #[test]
    fn job_errors_map_to_expected_status_codes() {
        assert_eq!(
            ApiError::from(JobError::Busy).status,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::from(JobError::InvalidInput("x".into())).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(JobError::NotReady).status,
            StatusCode::NOT_FOUND
        );
    }
}
