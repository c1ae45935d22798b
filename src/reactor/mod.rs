//! Request-dispatch reactor.
//!
//! # Data Flow
//! ```text
//! Deployment events:
//!     EventBus → Reactor event loop → handle_event
//!         → HandlerFactory::create → ApiHandler::start → RoutingTable
//!
//! Traffic:
//!     transport → Reactor::process
//!         → RoutingTable::lookup (prefix + virtual-host match)
//!         → ChainBuilder (timing ∘ reporting ∘ terminal)
//!         → ApiHandler::handle
//! ```
//!
//! # Design Decisions
//! - Lifecycle-event errors never escape `handle_event`; a broken deploy
//!   leaves the registry untouched and the event loop alive
//! - A handler is registered only after it started; start failure discards it
//! - Update is unregister-then-deploy: the path is briefly unserved rather
//!   than swapped atomically

pub mod chain;
pub mod table;

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::schema::ApiDefinition;
use crate::event::ApiEvent;
use crate::handler::{ApiHandler, HandlerFactory, NotFoundHandler};
use crate::http::{GatewayRequest, ResponseCallback};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::report::Reporter;

pub use chain::ChainBuilder;
pub use table::RoutingTable;

/// Orchestrates the routing table, the instrumentation chain and the handler
/// population's lifecycle.
pub struct Reactor {
    table: Arc<RoutingTable>,
    factory: Arc<dyn HandlerFactory>,
    chain: ChainBuilder,
    shutdown: Shutdown,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl Reactor {
    pub fn new(factory: Arc<dyn HandlerFactory>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            table: Arc::new(RoutingTable::new(Arc::new(NotFoundHandler))),
            factory,
            chain: ChainBuilder::new(reporter),
            shutdown: Shutdown::new(),
            event_loop: Mutex::new(None),
        }
    }

    /// Dispatch one request: resolve the responsible handler, wrap the
    /// terminal callback with the instrumentation chain, hand over.
    ///
    /// Returns as soon as the handler accepted the request; the wrapped
    /// callback fires later, from whatever thread the handler uses.
    pub fn process(&self, request: GatewayRequest, terminal: ResponseCallback) {
        tracing::debug!(
            request_id = %request.id(),
            path = %request.path(),
            "Dispatching request"
        );

        let handler = self.table.lookup(request.path(), request.host().as_deref());
        let callback = self.chain.build(&request, terminal);
        handler.handle(request, callback);
    }

    /// Apply one deployment event to the registry.
    ///
    /// All failures are contained here: logged, never propagated to the
    /// event-delivery task.
    pub fn handle_event(&self, event: &ApiEvent) {
        match event {
            ApiEvent::Deploy(api) => self.deploy(api),
            ApiEvent::Update(api) => self.update(api),
            ApiEvent::Undeploy(api) => self.undeploy(api),
        }
    }

    fn deploy(&self, api: &ApiDefinition) {
        if !api.enabled {
            tracing::warn!(api = %api.id, "API is disabled, skipping deployment");
            return;
        }

        let handler = match self.factory.create(api) {
            Ok(handler) => handler,
            Err(e) => {
                tracing::error!(api = %api.id, error = %e, "Unable to build handler");
                return;
            }
        };

        if let Err(e) = handler.start() {
            tracing::error!(api = %api.id, error = %e, "Unable to start handler");
            return;
        }

        if self.table.register(&api.id, Arc::clone(&handler)) {
            tracing::info!(
                api = %api.id,
                context_path = %handler.context_path(),
                "API deployed in reactor"
            );
            metrics::set_apis_deployed(self.table.len());
        } else {
            tracing::warn!(
                api = %api.id,
                context_path = %handler.context_path(),
                "Context path already registered, discarding handler"
            );
            stop_quietly(&api.id, handler.as_ref());
        }
    }

    fn update(&self, api: &ApiDefinition) {
        if self.table.context_path_of(&api.id).is_some() {
            self.undeploy(api);
        }
        self.deploy(api);
    }

    fn undeploy(&self, api: &ApiDefinition) {
        match self.table.unregister_by_api(&api.id) {
            Some(handler) => {
                stop_quietly(&api.id, handler.as_ref());
                tracing::info!(api = %api.id, "API removed from reactor");
                metrics::set_apis_deployed(self.table.len());
            }
            None => {
                tracing::debug!(api = %api.id, "Undeploy for an API that is not registered");
            }
        }
    }

    /// Stop and remove every registered handler, best-effort.
    pub fn clear_all(&self) {
        for handler in self.table.clear() {
            if let Err(e) = handler.stop() {
                tracing::error!(
                    context_path = %handler.context_path(),
                    error = %e,
                    "Unable to stop handler during shutdown"
                );
            }
        }
        metrics::set_apis_deployed(0);
    }

    /// Subscribe to the deployment event stream on a background task.
    pub fn start(self: &Arc<Self>, mut events: broadcast::Receiver<ApiEvent>) {
        let reactor = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            tracing::info!("Reactor subscribed to deployment events");
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    event = events.recv() => match event {
                        Ok(event) => reactor.handle_event(&event),
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "Reactor lagged behind the event stream");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::info!("Reactor event loop stopped");
        });

        if let Ok(mut slot) = self.event_loop.lock() {
            *slot = Some(handle);
        }
    }

    /// Unsubscribe from events, then tear down every handler.
    ///
    /// Safe to run concurrently with in-flight `process` calls: requests that
    /// already captured a handler reference complete against it.
    pub async fn stop(&self) {
        self.shutdown.trigger();
        let handle = match self.event_loop.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.clear_all();
    }

    pub(crate) fn table(&self) -> &RoutingTable {
        &self.table
    }
}

fn stop_quietly(api_id: &str, handler: &dyn ApiHandler) {
    if let Err(e) = handler.stop() {
        tracing::error!(api = %api_id, error = %e, "Unable to stop handler");
    }
}
