//! HTTP handlers
//!
//! Every request is independent. Uploaded PDFs live in a temporary file inside
//! the configured upload directory for the duration of the extraction call and
//! are removed when the handle drops, whichever way the handler exits.

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use finlens_report::{AnalysisRecord, ExtractedFinancials, RatioRecord, ratios};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

const UPLOAD_FIELD: &str = "file";

/// A PDF received from a multipart form
struct UploadedPdf {
    file: NamedTempFile,
    filename: String,
}

/// Full pipeline response
#[derive(Serialize)]
struct AnalyzeResponse {
    financial_data: ExtractedFinancials,
    financial_ratios: RatioRecord,
    market_analysis: AnalysisRecord,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract))
        .route("/analyze", post(analyze))
        .route("/ratios", post(compute_ratios))
        .route("/market_analysis", post(market_analysis))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "message": "API is running"}))
}

/// Extract figures from an uploaded PDF
#[instrument(skip_all)]
async fn extract(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ExtractedFinancials>> {
    let upload = receive_pdf(&state, multipart).await?;
    let extracted = state
        .extractor
        .extract_as(upload.file.path(), &upload.filename)
        .await?;
    Ok(Json(extracted))
}

/// Extract, compute ratios and analyze an uploaded PDF
#[instrument(skip_all)]
async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let upload = receive_pdf(&state, multipart).await?;
    let financial_data = state
        .extractor
        .extract_as(upload.file.path(), &upload.filename)
        .await?;
    drop(upload);

    let financial_ratios = ratios::compute(&financial_data.decode()?);
    let market_analysis = state.analyzer.analyze(&financial_ratios).await;
    info!(company = %financial_ratios.company, "Analysis complete");

    Ok(Json(AnalyzeResponse {
        financial_data,
        financial_ratios,
        market_analysis,
    }))
}

/// Ratio engine over a JSON body
async fn compute_ratios(body: Bytes) -> ApiResult<Json<RatioRecord>> {
    let value = json_body(&body)?;
    Ok(Json(ratios::compute_value(&value)?))
}

/// Market analysis over a JSON ratio record
async fn market_analysis(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<AnalysisRecord>> {
    let record: RatioRecord = serde_json::from_value(json_body(&body)?)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ratio record: {e}")))?;
    Ok(Json(state.analyzer.analyze(&record).await))
}

fn json_body(body: &[u8]) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("No JSON payload provided".to_string()));
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON payload: {e}")))
}

/// Read the `file` field into a temporary PDF
///
/// A request that is not a multipart form at all counts as having no file.
async fn receive_pdf(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadedPdf> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!(%rejection, "Request is not a multipart form");
        ApiError::BadRequest("No file provided".to_string())
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart field", &e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if filename.is_empty() {
            return Err(ApiError::BadRequest("No file selected".to_string()));
        }
        if !is_pdf(&filename) {
            return Err(ApiError::BadRequest("Only PDF files are allowed".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file content", &e))?;

        let file = tempfile::Builder::new()
            .prefix("finlens-")
            .suffix(".pdf")
            .tempfile_in(&state.upload_dir)?;
        tokio::fs::write(file.path(), &bytes).await?;
        info!(%filename, bytes = bytes.len(), "Received upload");

        return Ok(UploadedPdf { file, filename });
    }

    Err(ApiError::BadRequest("No file provided".to_string()))
}

/// Keep the body-limit status instead of folding it into a 400
fn multipart_error(context: &str, err: &MultipartError) -> ApiError {
    let message = format!("{context}: {}", err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::BadRequest(message)
    }
}

fn is_pdf(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf("report.pdf"));
        assert!(is_pdf("Annual Report 2024.PDF"));
        assert!(!is_pdf("report.pdf.exe"));
        assert!(!is_pdf("pdf"));
        assert!(!is_pdf("report"));
    }

    #[test]
    fn test_json_body() {
        assert!(matches!(json_body(b"  \n"), Err(ApiError::BadRequest(m)) if m == "No JSON payload provided"));
        assert!(matches!(json_body(b"{not json"), Err(ApiError::BadRequest(_))));
        assert_eq!(json_body(br#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }
}
