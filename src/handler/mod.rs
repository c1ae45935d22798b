//! Handler subsystem.
//!
//! # Data Flow
//! ```text
//! Deployment event (ApiDefinition)
//!     → HandlerFactory::create → ApiHandler (state: Created)
//!     → ApiHandler::start       (state: Started, or FailedToStart)
//!     → registered in the routing table
//!
//! Traffic:
//!     Reactor::process → ApiHandler::handle(request, callback)
//! ```
//!
//! # Design Decisions
//! - One trait for every handler variant (proxy, not-found, test doubles)
//! - Lifecycle transitions are forward-only and atomic (lifecycle.rs)
//! - `handle` consumes the request; the callback fires at most once,
//!   possibly from another thread

pub mod lifecycle;
pub mod not_found;
pub mod proxy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use thiserror::Error;

use crate::config::schema::ApiDefinition;
use crate::http::{GatewayRequest, ResponseCallback};

pub use lifecycle::{Lifecycle, LifecycleState};
pub use not_found::NotFoundHandler;
pub use proxy::{ProxyHandler, ProxyHandlerFactory};

/// Errors surfaced by a handler's lifecycle operations.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler failed to start: {0}")]
    StartFailed(String),

    #[error("handler failed to stop: {0}")]
    StopFailed(String),

    #[error("invalid lifecycle transition from {0:?}")]
    InvalidTransition(LifecycleState),
}

/// Error returned when a factory cannot build a handler.
#[derive(Debug, Error)]
#[error("unable to build handler for API {api}: {reason}")]
pub struct FactoryError {
    pub api: String,
    pub reason: String,
}

/// The runtime unit serving requests for one deployed API.
///
/// Only handlers that reached `Started` are ever registered for routing.
pub trait ApiHandler: Send + Sync + 'static {
    /// URL path prefix this handler is mounted on.
    fn context_path(&self) -> &str;

    /// Optional hostname binding disambiguating overlapping context paths.
    fn virtual_host(&self) -> Option<&str> {
        None
    }

    fn start(&self) -> Result<(), HandlerError>;

    fn stop(&self) -> Result<(), HandlerError>;

    /// Serve the request and eventually invoke `callback` with the response.
    ///
    /// Must not block the calling thread beyond dispatch; any real work
    /// happens on the handler's own execution model.
    fn handle(&self, request: GatewayRequest, callback: ResponseCallback);
}

/// Builds a handler from an API definition.
///
/// Construction may fail; the reactor catches and logs, leaving the API
/// unserved.
pub trait HandlerFactory: Send + Sync {
    fn create(&self, api: &ApiDefinition) -> Result<Arc<dyn ApiHandler>, FactoryError>;
}
