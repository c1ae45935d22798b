//! Test doubles for the handler trait, shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::http::StatusCode;

use crate::http::{GatewayRequest, GatewayResponse, ResponseCallback};

use super::{ApiHandler, HandlerError, Lifecycle};

/// Scriptable in-memory handler.
///
/// Responds with a fixed status and a body naming the handler, so tests can
/// assert which handler served a request. An optional delay is applied on a
/// separate thread before the callback fires, to exercise the
/// any-thread/any-time callback contract.
pub(crate) struct StubHandler {
    label: String,
    context_path: String,
    virtual_host: Option<String>,
    status: StatusCode,
    fail_start: bool,
    fail_stop: bool,
    delay: Option<Duration>,
    lifecycle: Lifecycle,
    stops: AtomicUsize,
}

impl StubHandler {
    pub fn new(context_path: &str) -> Self {
        Self {
            label: context_path.to_string(),
            context_path: context_path.to_string(),
            virtual_host: None,
            status: StatusCode::OK,
            fail_start: false,
            fail_stop: false,
            delay: None,
            lifecycle: Lifecycle::new(),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_virtual_host(mut self, host: &str) -> Self {
        self.virtual_host = Some(host.to_string());
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl ApiHandler for StubHandler {
    fn context_path(&self) -> &str {
        &self.context_path
    }

    fn virtual_host(&self) -> Option<&str> {
        self.virtual_host.as_deref()
    }

    fn start(&self) -> Result<(), HandlerError> {
        if self.fail_start {
            self.lifecycle.mark_failed();
            return Err(HandlerError::StartFailed("scripted failure".into()));
        }
        self.lifecycle.mark_started()
    }

    fn stop(&self) -> Result<(), HandlerError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(HandlerError::StopFailed("scripted failure".into()));
        }
        self.lifecycle.mark_stopped()
    }

    fn handle(&self, _request: GatewayRequest, callback: ResponseCallback) {
        let response = GatewayResponse::with_body(self.status, self.label.clone());
        match self.delay {
            Some(delay) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    callback(response);
                });
            }
            None => callback(response),
        }
    }
}
