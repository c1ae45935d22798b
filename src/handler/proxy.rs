//! Upstream proxy handler: the production handler variant.
//!
//! Forwards every request for a deployed API to the API's upstream base URL,
//! rewriting scheme and authority while preserving path, query and headers.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::{HeaderValue, Request, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::schema::ApiDefinition;
use crate::http::{GatewayRequest, GatewayResponse, ResponseCallback};

use super::{ApiHandler, FactoryError, HandlerError, HandlerFactory, Lifecycle};

/// Cap on buffered upstream response bodies.
const MAX_RESPONSE_BODY: usize = 1024 * 1024;

/// Serves one deployed API by proxying to its upstream.
pub struct ProxyHandler {
    api: ApiDefinition,
    lifecycle: Lifecycle,
    client: Client<HttpConnector, Body>,
    // Resolved from `api.upstream` during start.
    target: OnceLock<(Scheme, Authority)>,
}

impl ProxyHandler {
    fn new(api: ApiDefinition, client: Client<HttpConnector, Body>) -> Self {
        Self {
            api,
            lifecycle: Lifecycle::new(),
            client,
            target: OnceLock::new(),
        }
    }

    /// Rewrite the inbound URI to point at the upstream authority.
    fn upstream_uri(&self, request: &GatewayRequest) -> Option<Uri> {
        let (scheme, authority) = self.target.get()?;
        let mut parts = request.uri().clone().into_parts();
        parts.scheme = Some(scheme.clone());
        parts.authority = Some(authority.clone());
        Uri::from_parts(parts).ok()
    }
}

impl ApiHandler for ProxyHandler {
    fn context_path(&self) -> &str {
        &self.api.context_path
    }

    fn virtual_host(&self) -> Option<&str> {
        self.api.virtual_host.as_deref()
    }

    fn start(&self) -> Result<(), HandlerError> {
        let uri: Uri = self.api.upstream.parse().map_err(|_| {
            self.lifecycle.mark_failed();
            HandlerError::StartFailed(format!("invalid upstream URL: {}", self.api.upstream))
        })?;

        let scheme = uri.scheme().cloned();
        let authority = uri.authority().cloned();
        match (scheme, authority) {
            (Some(scheme), Some(authority)) => {
                let _ = self.target.set((scheme, authority));
                self.lifecycle.mark_started()
            }
            _ => {
                self.lifecycle.mark_failed();
                Err(HandlerError::StartFailed(format!(
                    "upstream URL must carry scheme and host: {}",
                    self.api.upstream
                )))
            }
        }
    }

    fn stop(&self) -> Result<(), HandlerError> {
        self.lifecycle.mark_stopped()
    }

    fn handle(&self, request: GatewayRequest, callback: ResponseCallback) {
        if !self.lifecycle.is_started() {
            tracing::warn!(
                api = %self.api.id,
                request_id = %request.id(),
                "Handler received a request outside the Started state"
            );
            callback(GatewayResponse::new(StatusCode::SERVICE_UNAVAILABLE));
            return;
        }

        let uri = match self.upstream_uri(&request) {
            Some(uri) => uri,
            None => {
                tracing::error!(api = %self.api.id, "Unable to build upstream URI");
                callback(GatewayResponse::new(StatusCode::BAD_GATEWAY));
                return;
            }
        };

        let mut outbound = Request::builder().method(request.method().clone()).uri(uri);
        if let Some(headers) = outbound.headers_mut() {
            for (k, v) in request.headers().iter() {
                headers.insert(k.clone(), v.clone());
            }
            // Propagate the gateway-assigned request ID upstream.
            if let Ok(id) = HeaderValue::from_str(request.id()) {
                headers.insert("x-request-id", id);
            }
        }
        let outbound = match outbound.body(Body::from(request.body().clone())) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(api = %self.api.id, error = %e, "Unable to build upstream request");
                callback(GatewayResponse::new(StatusCode::BAD_GATEWAY));
                return;
            }
        };

        let client = self.client.clone();
        let api_id = self.api.id.clone();
        let request_id = request.id().to_string();
        tokio::spawn(async move {
            match client.request(outbound).await {
                Ok(response) => {
                    let status = response.status();
                    let (parts, body) = response.into_parts();
                    let body =
                        match axum::body::to_bytes(Body::new(body), MAX_RESPONSE_BODY).await {
                            Ok(bytes) => bytes,
                            Err(e) => {
                                tracing::error!(
                                    api = %api_id,
                                    request_id = %request_id,
                                    error = %e,
                                    "Failed to read upstream response body"
                                );
                                callback(GatewayResponse::new(StatusCode::BAD_GATEWAY));
                                return;
                            }
                        };
                    callback(GatewayResponse {
                        status,
                        headers: parts.headers,
                        body,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        api = %api_id,
                        request_id = %request_id,
                        error = %e,
                        "Upstream request failed"
                    );
                    callback(GatewayResponse::with_body(
                        StatusCode::BAD_GATEWAY,
                        "Upstream request failed",
                    ));
                }
            }
        });
    }
}

/// Production [`HandlerFactory`] building [`ProxyHandler`]s.
///
/// All handlers share one pooled hyper client.
pub struct ProxyHandlerFactory {
    client: Client<HttpConnector, Body>,
}

impl ProxyHandlerFactory {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
        }
    }
}

impl Default for ProxyHandlerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerFactory for ProxyHandlerFactory {
    fn create(&self, api: &ApiDefinition) -> Result<Arc<dyn ApiHandler>, FactoryError> {
        if api.context_path.is_empty() || !api.context_path.starts_with('/') {
            return Err(FactoryError {
                api: api.id.clone(),
                reason: format!("context path must start with '/': {:?}", api.context_path),
            });
        }
        Ok(Arc::new(ProxyHandler::new(api.clone(), self.client.clone())))
    }
}
