//! In-core request model.

use std::time::Instant;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method, Uri};
use uuid::Uuid;

/// A fully buffered inbound request, decoupled from the transport layer.
///
/// Carries the receipt timestamp so the instrumentation chain can measure
/// elapsed time from the moment the request entered the gateway, not from
/// the moment a handler picked it up.
#[derive(Debug)]
pub struct GatewayRequest {
    id: String,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    received_at: Instant,
}

impl GatewayRequest {
    /// Build a request with a fresh UUID v4 request ID.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            method,
            uri,
            headers,
            body,
            received_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path component, always starting with `/`.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Resolve the target host for virtual-host routing.
    ///
    /// Prefers the Host header, falling back to the host of the request URI
    /// when the header is absent or empty. A `:port` suffix is stripped so
    /// both sources compare equal.
    pub fn host(&self) -> Option<String> {
        let from_header = self
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|h| !h.is_empty());

        match from_header {
            Some(h) => Some(strip_port(h).to_ascii_lowercase()),
            None => self.uri.host().map(|h| h.to_ascii_lowercase()),
        }
    }
}

/// Strip a trailing `:port` from a host value.
fn strip_port(host: &str) -> &str {
    match host.rfind(':') {
        // Don't touch bracketed IPv6 literals without a port.
        Some(idx) if !host[idx + 1..].contains(']') => &host[..idx],
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn request(uri: &str, host_header: Option<&str>) -> GatewayRequest {
        let mut headers = HeaderMap::new();
        if let Some(h) = host_header {
            headers.insert(header::HOST, HeaderValue::from_str(h).unwrap());
        }
        GatewayRequest::new(Method::GET, uri.parse().unwrap(), headers, Bytes::new())
    }

    #[test]
    fn host_prefers_header() {
        let req = request("http://uri.example.com/api", Some("header.example.com"));
        assert_eq!(req.host().as_deref(), Some("header.example.com"));
    }

    #[test]
    fn host_falls_back_to_uri() {
        let req = request("http://uri.example.com/api", None);
        assert_eq!(req.host().as_deref(), Some("uri.example.com"));
    }

    #[test]
    fn host_strips_port_and_lowercases() {
        let req = request("/api", Some("A.Example.Com:8082"));
        assert_eq!(req.host().as_deref(), Some("a.example.com"));
    }

    #[test]
    fn path_excludes_query() {
        let req = request("http://example.com/api/v1?x=1", None);
        assert_eq!(req.path(), "/api/v1");
    }
}
