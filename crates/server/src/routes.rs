use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use prestige_core::ImageKind;
use prestige_ocr::TextDetector;
use prestige_warehouse::Warehouse;

use crate::pipeline::{run_check, PipelineError};
use crate::present::{present, CheckKind, PresentedCheck};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub detector: Arc<dyn TextDetector>,
    pub warehouse: Arc<dyn Warehouse>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/check", post(check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no file field in upload")]
    MissingFile,
    #[error("unsupported image type; upload png, jpg or jpeg")]
    UnsupportedType,
    #[error("malformed upload: {0}")]
    BadUpload(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingFile | ApiError::BadUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Pipeline(PipelineError::Prepare(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Pipeline(PipelineError::Ocr(_)) => StatusCode::BAD_GATEWAY,
        };
        warn!(%status, error = %self, "check request failed");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
pub struct CheckResponse {
    /// The sharpened, contrast-enhanced upload, for display next to the results.
    pub image_jpeg_base64: String,
    pub warranty: PresentedCheck,
    pub product: PresentedCheck,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

struct Upload {
    kind: ImageKind,
    data: Vec<u8>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadUpload(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let kind = ImageKind::from_upload(content_type.as_deref(), file_name.as_deref())
            .ok_or(ApiError::UnsupportedType)?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadUpload(e.to_string()))?;
        return Ok(Some(Upload {
            kind,
            data: data.to_vec(),
        }));
    }
    Ok(None)
}

async fn check(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<CheckResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("check", %request_id);

    async move {
        let Some(upload) = read_upload(&mut multipart).await? else {
            info!("waiting on upload");
            return Err(ApiError::MissingFile);
        };
        info!(kind = %upload.kind, bytes = upload.data.len(), "upload received");

        let report = run_check(
            state.detector.as_ref(),
            state.warehouse.as_ref(),
            &upload.data,
        )
        .await?;

        Ok(Json(CheckResponse {
            image_jpeg_base64: BASE64_STANDARD.encode(&report.image_jpeg),
            warranty: present(CheckKind::Warranty, &report.warranty),
            product: present(CheckKind::Product, &report.product),
        }))
    }
    .instrument(span)
    .await
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Warranty Validity Checker</title>
<style>
  body { font-family: sans-serif; max-width: 44rem; margin: 2rem auto; padding: 0 1rem; }
  img { max-width: 100%; margin-top: 1rem; }
  .check { padding: .6rem .8rem; border-radius: 4px; margin-top: .8rem; }
  .success { background: #e6f6e6; }
  .warning { background: #fdf6dd; }
  .error { background: #fbe3e3; }
  table { border-collapse: collapse; margin-top: .5rem; }
  td, th { border: 1px solid #bbb; padding: .3rem .6rem; text-align: left; }
</style>
</head>
<body>
<h1>Warranty Validity Checker</h1>
<p>Upload an invoice image (png, jpg, jpeg) to extract the Warranty ID.</p>
<form id="form">
  <input type="file" name="file" accept=".png,.jpg,.jpeg" required>
  <button type="submit">Check</button>
</form>
<div id="out"></div>
<script>
const form = document.getElementById('form');
const out = document.getElementById('out');
form.addEventListener('submit', async (e) => {
  e.preventDefault();
  out.textContent = 'Checking…';
  const resp = await fetch('/api/check', { method: 'POST', body: new FormData(form) });
  const body = await resp.json();
  if (!resp.ok) { out.textContent = body.error; return; }
  out.innerHTML = '';
  const img = document.createElement('img');
  img.src = 'data:image/jpeg;base64,' + body.image_jpeg_base64;
  out.appendChild(img);
  for (const check of [body.warranty, body.product]) {
    const div = document.createElement('div');
    div.className = 'check ' + check.severity;
    div.textContent = check.detected ? check.message + ' (' + check.detected + ')' : check.message;
    if (check.table) {
      const table = document.createElement('table');
      table.innerHTML = '<tr>' + check.table.columns.map(c => '<th>' + c + '</th>').join('') + '</tr>'
        + '<tr>' + check.table.row.map(v => '<td>' + v + '</td>').join('') + '</tr>';
      div.appendChild(table);
    }
    out.appendChild(div);
  }
});
</script>
</body>
</html>
"#;

// ── Tests ─────────────────────────────────────────────────────────────────────
