//! Instrumentation chain: timing and reporting wrapped around the terminal
//! response callback.
//!
//! Composition order is fixed: timing wraps reporting wraps terminal. The
//! elapsed-time measurement therefore brackets the reporting side effect and
//! the terminal callback, not just the terminal callback alone.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::http::{GatewayRequest, GatewayResponse, ResponseCallback};
use crate::report::{AccessRecord, Reporter, RequestInfo};

/// Callback stage that has already been handed the measured elapsed time.
type TimedCallback = Box<dyn FnOnce(GatewayResponse, Duration) + Send + 'static>;

/// Builds the per-request decorator chain on the dispatch thread, before
/// control passes to the handler. The resulting callback may then fire from
/// any thread the handler's execution model uses.
#[derive(Clone)]
pub struct ChainBuilder {
    reporter: Arc<dyn Reporter>,
}

impl ChainBuilder {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    pub fn build(&self, request: &GatewayRequest, terminal: ResponseCallback) -> ResponseCallback {
        let reporting = Self::reporting(
            Arc::clone(&self.reporter),
            RequestInfo::of(request),
            terminal,
        );
        Self::timing(request.received_at(), reporting)
    }

    /// Outermost decorator: measures wall-clock time from request receipt to
    /// callback invocation and passes it inward.
    fn timing(received_at: Instant, next: TimedCallback) -> ResponseCallback {
        Box::new(move |response| {
            let elapsed = received_at.elapsed();
            next(response, elapsed);
        })
    }

    /// Inner decorator: emits the access record, then delegates.
    fn reporting(
        reporter: Arc<dyn Reporter>,
        info: RequestInfo,
        next: ResponseCallback,
    ) -> TimedCallback {
        Box::new(move |response, elapsed| {
            reporter.report(&AccessRecord::complete(info, response.status(), elapsed));
            next(response);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::RecordingReporter;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(path: &str) -> GatewayRequest {
        GatewayRequest::new(
            Method::GET,
            path.parse().unwrap(),
            HeaderMap::new(),
            Bytes::new(),
        )
    }

    #[test]
    fn reports_then_delegates() {
        let reporter = Arc::new(RecordingReporter::default());
        let builder = ChainBuilder::new(reporter.clone());
        let request = request("/team/a");

        let delegated = Arc::new(AtomicUsize::new(0));
        let seen = delegated.clone();
        let reporter_probe = reporter.clone();
        let chained = builder.build(
            &request,
            Box::new(move |response| {
                // Reporting must already have happened when the terminal
                // callback runs.
                assert_eq!(reporter_probe.records.lock().unwrap().len(), 1);
                assert_eq!(response.status(), StatusCode::OK);
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        chained(GatewayResponse::new(StatusCode::OK));

        assert_eq!(delegated.load(Ordering::SeqCst), 1);
        let records = reporter.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "/team/a");
        assert_eq!(records[0].status, StatusCode::OK);
    }

    #[test]
    fn elapsed_brackets_the_delay_before_invocation() {
        let reporter = Arc::new(RecordingReporter::default());
        let builder = ChainBuilder::new(reporter.clone());
        let request = request("/slow");

        let chained = builder.build(&request, Box::new(|_| {}));

        let delay = Duration::from_millis(30);
        std::thread::sleep(delay);
        chained(GatewayResponse::new(StatusCode::OK));

        let records = reporter.records.lock().unwrap();
        assert!(
            records[0].elapsed >= delay,
            "elapsed {:?} < inserted delay {:?}",
            records[0].elapsed,
            delay
        );
    }

    #[test]
    fn callback_may_fire_from_another_thread() {
        let reporter = Arc::new(RecordingReporter::default());
        let builder = ChainBuilder::new(reporter.clone());
        let request = request("/threaded");

        let chained = builder.build(&request, Box::new(|_| {}));
        std::thread::spawn(move || chained(GatewayResponse::new(StatusCode::NO_CONTENT)))
            .join()
            .unwrap();

        assert_eq!(
            reporter.records.lock().unwrap()[0].status,
            StatusCode::NO_CONTENT
        );
    }
}
