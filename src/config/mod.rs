//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml
//!     → loader.rs (read + parse)
//!     → validation.rs (semantic checks, all errors at once)
//!     → GatewayConfig (schema.rs)
//! ```
//!
//! # Design Decisions
//! - serde handles syntax; validation.rs handles semantics
//! - Validation returns every error, not just the first
//! - API definitions ride in the same file as listener settings; richer
//!   definition sources stay behind the deployment event interface

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ApiDefinition, GatewayConfig};
