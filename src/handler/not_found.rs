//! Fallback handler for requests that match no deployed API.

use crate::http::{GatewayRequest, GatewayResponse, ResponseCallback};

use super::{ApiHandler, HandlerError};

/// Answers 404 for anything the routing table cannot place.
///
/// Never registered in the routing table itself; the table hands it out
/// whenever a lookup comes up empty. Stateless, so start/stop are no-ops.
#[derive(Debug, Default)]
pub struct NotFoundHandler;

impl ApiHandler for NotFoundHandler {
    fn context_path(&self) -> &str {
        "/"
    }

    fn start(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    fn stop(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    fn handle(&self, request: GatewayRequest, callback: ResponseCallback) {
        tracing::debug!(
            request_id = %request.id(),
            path = %request.path(),
            "No handler found, serving not-found response"
        );
        callback(GatewayResponse::not_found());
    }
}
