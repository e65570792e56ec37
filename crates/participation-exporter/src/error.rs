//! Error types for the exporter.
//!
//! [`ExporterError`] covers registry construction and encoding. It converts
//! into a plain-text HTTP 500 response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur while building or encoding the metrics registry.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// A metric could not be created, registered or encoded.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The encoder produced invalid UTF-8.
    #[error("metrics encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl IntoResponse for ExporterError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
