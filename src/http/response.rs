//! In-core response model and the response callback type.

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};

/// Callback invoked with the final response, at most once, from any thread.
pub type ResponseCallback = Box<dyn FnOnce(GatewayResponse) + Send + 'static>;

/// A fully buffered response produced by a handler.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl GatewayResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_body(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// The response served when no handler matches a request.
    pub fn not_found() -> Self {
        Self::with_body(StatusCode::NOT_FOUND, "No API matches the request path")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}
