use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use finlens_report::ReportError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Rejected before any model call: missing file, bad extension, bad body
    #[error("{0}")]
    BadRequest(String),
    /// Upload larger than the configured body limit
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Report(#[from] ReportError),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Report(e) => match e {
                ReportError::Computation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ReportError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ReportError::Extraction { .. }
                | ReportError::Analysis { .. }
                | ReportError::Io(_)
                | ReportError::Json(_)
                | ReportError::Prompt(_)
                | ReportError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, "{self}");
        } else {
            tracing::warn!(%status, "{self}");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
