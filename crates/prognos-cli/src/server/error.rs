use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prognos_classifiers::PredictError;
use serde::Serialize;

/// Error body shared by every endpoint: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        ApiError {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    /// 500 with the failure rendered as `"<prefix>: <error>"`.
    pub fn internal(prefix: &str, err: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}: {}", prefix, err),
        )
    }

    /// Rejected uploads keep their message as a 400; every other pipeline
    /// failure becomes an opaque 500.
    pub fn from_predict(prefix: &str, err: PredictError) -> Self {
        match err {
            PredictError::InvalidUpload(msg) => Self::bad_request(msg),
            other => Self::internal(prefix, other),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::error!("[Prognos::Server] {}", self.detail);
        } else {
            log::warn!("[Prognos::Server] {} {}", self.status.as_u16(), self.detail);
        }
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}
