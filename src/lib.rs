//! API Gateway Request-Dispatch Core Library

pub mod config;
pub mod event;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reactor;
pub mod report;

pub use config::schema::GatewayConfig;
pub use http::server::GatewayServer;
pub use lifecycle::Shutdown;
pub use reactor::Reactor;
