//! Access reporting.
//!
//! # Data Flow
//! ```text
//! Instrumentation chain (per response)
//!     → AccessRecord { request id, method, path, host, status, elapsed }
//!     → Reporter::report (fire-and-forget)
//!         → TracingReporter  (structured access log)
//!         → MetricsReporter  (Prometheus counters/histograms)
//! ```
//!
//! # Design Decisions
//! - `report` is infallible by signature; a broken reporter can never fail
//!   or block the request path
//! - Reporters fan out through `FanoutReporter` rather than nesting

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};

use crate::http::GatewayRequest;
use crate::observability::metrics;

/// Request-side fields of an access record, captured before dispatch.
///
/// The request itself is consumed by the handler, so the instrumentation
/// chain snapshots what reporting needs while it still owns a reference.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub request_id: String,
    pub method: Method,
    pub path: String,
    pub host: Option<String>,
}

impl RequestInfo {
    pub fn of(request: &GatewayRequest) -> Self {
        Self {
            request_id: request.id().to_string(),
            method: request.method().clone(),
            path: request.path().to_string(),
            host: request.host(),
        }
    }
}

/// One served request, as seen by the reporting pipeline.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub request_id: String,
    pub method: Method,
    pub path: String,
    pub host: Option<String>,
    pub status: StatusCode,
    pub elapsed: Duration,
}

impl AccessRecord {
    /// Join the pre-dispatch snapshot with the response-side outcome.
    pub fn complete(info: RequestInfo, status: StatusCode, elapsed: Duration) -> Self {
        Self {
            request_id: info.request_id,
            method: info.method,
            path: info.path,
            host: info.host,
            status,
            elapsed,
        }
    }
}

/// Sink for access records. Fire-and-forget.
pub trait Reporter: Send + Sync {
    fn report(&self, record: &AccessRecord);
}

/// Emits one structured access log line per request.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, record: &AccessRecord) {
        tracing::info!(
            target: "api_gateway::access",
            request_id = %record.request_id,
            method = %record.method,
            path = %record.path,
            host = record.host.as_deref().unwrap_or("-"),
            status = record.status.as_u16(),
            elapsed_ms = record.elapsed.as_millis() as u64,
            "Request served"
        );
    }
}

/// Records request counters and latency histograms.
#[derive(Debug, Default)]
pub struct MetricsReporter;

impl Reporter for MetricsReporter {
    fn report(&self, record: &AccessRecord) {
        metrics::record_request(record.method.as_str(), record.status.as_u16(), record.elapsed);
    }
}

/// Dispatches every record to a set of reporters.
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn Reporter>>,
}

impl FanoutReporter {
    pub fn new(reporters: Vec<Arc<dyn Reporter>>) -> Self {
        Self { reporters }
    }
}

impl Reporter for FanoutReporter {
    fn report(&self, record: &AccessRecord) {
        for reporter in &self.reporters {
            reporter.report(record);
        }
    }
}
