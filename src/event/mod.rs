//! Deployment event model and delivery.
//!
//! # Data Flow
//! ```text
//! Deployment source (config load, admin action, sync job)
//!     → EventBus::publish(ApiEvent)
//!     → broadcast channel
//!     → Reactor event loop → registry mutation
//! ```
//!
//! # Design Decisions
//! - Events are consumed once and never persisted
//! - tokio broadcast keeps publishers decoupled from subscribers
//! - A lagging subscriber drops old events rather than blocking publishers

use tokio::sync::broadcast;

use crate::config::schema::ApiDefinition;

/// Lifecycle notification for one API.
#[derive(Debug, Clone)]
pub enum ApiEvent {
    /// A new API was deployed and should start serving traffic.
    Deploy(ApiDefinition),
    /// An existing API definition changed; its handler must be rebuilt.
    Update(ApiDefinition),
    /// The API was removed and must stop serving traffic.
    Undeploy(ApiDefinition),
}

impl ApiEvent {
    pub fn api(&self) -> &ApiDefinition {
        match self {
            ApiEvent::Deploy(api) | ApiEvent::Update(api) | ApiEvent::Undeploy(api) => api,
        }
    }
}

/// Broadcast channel distributing deployment events to subscribers.
pub struct EventBus {
    tx: broadcast::Sender<ApiEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ApiEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to every current subscriber.
    ///
    /// An event published with no live subscriber is dropped with a warning;
    /// deployment events are not replayed.
    pub fn publish(&self, event: ApiEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::warn!(api = %e.0.api().id, "Deployment event dropped: no subscriber");
        }
    }
}
