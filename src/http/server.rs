//! Transport adapter.
//!
//! # Responsibilities
//! - Build the axum router with a catch-all dispatch route
//! - Wire up middleware (request timeout, tracing)
//! - Convert transport requests to the in-core model and bridge the
//!   response callback back to the awaiting connection task
//! - Serve with graceful shutdown
//!
//! The reactor itself never touches these types; everything
//! transport-specific ends at this file.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::{GatewayRequest, GatewayResponse};
use crate::lifecycle::Shutdown;
use crate::reactor::Reactor;

/// State injected into the dispatch handler.
#[derive(Clone)]
struct AppState {
    reactor: Arc<Reactor>,
    max_body_bytes: usize,
}

/// HTTP front end feeding the reactor.
pub struct GatewayServer {
    router: Router,
    shutdown: Shutdown,
}

impl GatewayServer {
    pub fn new(config: &GatewayConfig, reactor: Arc<Reactor>, shutdown: Shutdown) -> Self {
        let state = AppState {
            reactor,
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http());

        Self { router, shutdown }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway server starting");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("Gateway server stopped");
        Ok(())
    }
}

/// Catch-all handler: buffer the body, hand the request to the reactor and
/// await the response callback through a oneshot channel.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
        }
    };

    let request = GatewayRequest::new(parts.method, parts.uri, parts.headers, body);
    let request_id = request.id().to_string();

    let (tx, rx) = oneshot::channel();
    state.reactor.process(
        request,
        Box::new(move |response| {
            let _ = tx.send(response);
        }),
    );

    match rx.await {
        Ok(response) => into_transport(response),
        Err(_) => {
            // The callback was dropped without firing; a handler bug, but the
            // connection still deserves an answer.
            tracing::error!(request_id = %request_id, "Handler dropped the response callback");
            (StatusCode::BAD_GATEWAY, "Handler produced no response").into_response()
        }
    }
}

fn into_transport(response: GatewayResponse) -> Response {
    let mut headers = response.headers;
    // The body was buffered; framing headers from the upstream no longer
    // apply and hyper recomputes content-length.
    headers.remove(header::TRANSFER_ENCODING);
    headers.remove(header::CONTENT_LENGTH);

    let mut out = Response::new(Body::from(response.body));
    *out.status_mut() = response.status;
    *out.headers_mut() = headers;
    out
}
