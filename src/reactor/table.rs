//! Concurrent routing table: context path → live handler.
//!
//! # Responsibilities
//! - Register/unregister handlers as deployment events arrive
//! - Resolve the handler for a request path + host, never failing
//! - Keep a reverse index from API identity to context path, so events that
//!   carry only the API identity can find the handler to remove
//!
//! # Design Decisions
//! - DashMap for both maps: lookups never block on registrations, entries
//!   are never observed half-constructed
//! - Registration is atomic-if-absent via the entry API; a concurrent
//!   duplicate deploy loses and is told so, never overwrites
//! - Prefix matching is multi-candidate, not longest-prefix-wins; candidate
//!   order is stable (sorted by context path) for a given table snapshot

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::handler::ApiHandler;

/// Normalize a context path to its trailing-slash form, so `/api` can never
/// accidentally match a request for `/apix`.
fn normalize(context_path: &str) -> String {
    let trimmed = context_path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("{trimmed}/")
    }
}

/// Registry of live handlers, shared between traffic and the event loop.
pub struct RoutingTable {
    /// Normalized context path → active handler.
    handlers: DashMap<String, Arc<dyn ApiHandler>>,
    /// API identity → normalized context path.
    context_paths: DashMap<String, String>,
    /// Served when nothing matches. Never present in `handlers`.
    fallback: Arc<dyn ApiHandler>,
}

impl RoutingTable {
    pub fn new(fallback: Arc<dyn ApiHandler>) -> Self {
        Self {
            handlers: DashMap::new(),
            context_paths: DashMap::new(),
            fallback,
        }
    }

    /// Resolve the handler for a request path and resolved host. Total: falls
    /// back to the not-found handler when nothing matches.
    ///
    /// Candidates carrying a virtual host are tried first against the host;
    /// a candidate without one acts as a wildcard for any remaining match.
    pub fn lookup(&self, path: &str, host: Option<&str>) -> Arc<dyn ApiHandler> {
        let probe = normalize(path);

        let mut candidates: Vec<(String, Arc<dyn ApiHandler>)> = self
            .handlers
            .iter()
            .filter(|entry| probe.starts_with(entry.key().as_str()))
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        tracing::debug!(path = %path, candidates = candidates.len(), "Routing lookup");

        // Stable order across calls for an unchanged registry.
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        if let Some(host) = host {
            for (_, handler) in &candidates {
                match handler.virtual_host() {
                    Some(vhost) if vhost.eq_ignore_ascii_case(host) => {
                        return Arc::clone(handler);
                    }
                    _ => {}
                }
            }
        }

        // Virtual-host absence is a wildcard.
        for (_, handler) in &candidates {
            if handler.virtual_host().is_none() {
                return Arc::clone(handler);
            }
        }

        Arc::clone(&self.fallback)
    }

    /// Insert the handler under its context path, if the path is free.
    ///
    /// Returns `false` without touching the table when another handler
    /// already owns the path; the caller is expected to discard the loser.
    pub fn register(&self, api_id: &str, handler: Arc<dyn ApiHandler>) -> bool {
        let key = normalize(handler.context_path());
        match self.handlers.entry(key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handler);
                self.context_paths.insert(api_id.to_string(), key);
                true
            }
        }
    }

    /// Remove the handler owned by `api_id`, if any, returning it so the
    /// caller can stop it.
    ///
    /// A secondary-index entry whose primary entry is already gone counts as
    /// "already removed" and yields `None`.
    pub fn unregister_by_api(&self, api_id: &str) -> Option<Arc<dyn ApiHandler>> {
        let (_, key) = self.context_paths.remove(api_id)?;
        self.handlers.remove(&key).map(|(_, handler)| handler)
    }

    /// The context path currently registered for an API, if any.
    pub fn context_path_of(&self, api_id: &str) -> Option<String> {
        self.context_paths.get(api_id).map(|entry| entry.value().clone())
    }

    /// Remove and return every registered handler.
    pub fn clear(&self) -> Vec<Arc<dyn ApiHandler>> {
        let keys: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        let removed = keys
            .into_iter()
            .filter_map(|key| self.handlers.remove(&key).map(|(_, handler)| handler))
            .collect();
        self.context_paths.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
