//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound connection (axum/hyper)
//!     → server.rs (body buffering, request conversion)
//!     → Reactor::process (dispatch)
//!     → response callback → server.rs (response conversion)
//!
//! Core model:
//!     request.rs  (GatewayRequest: id, method, uri, headers, body)
//!     response.rs (GatewayResponse + ResponseCallback)
//! ```
//!
//! # Design Decisions
//! - The reactor never sees transport types; it works on the buffered
//!   `GatewayRequest`/`GatewayResponse` pair only
//! - Bodies are buffered with a configurable cap before dispatch
//! - The response callback is `FnOnce`, invocable from any thread, at most once

pub mod request;
pub mod response;
pub mod server;

pub use request::GatewayRequest;
pub use response::{GatewayResponse, ResponseCallback};
