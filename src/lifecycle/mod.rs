//! Process lifecycle coordination.
//!
//! # Design Decisions
//! - One broadcast-backed shutdown signal shared by the reactor event loop
//!   and the transport server
//! - Triggering is idempotent; late subscribers resolve immediately once
//!   the signal fired

pub mod shutdown;

pub use shutdown::Shutdown;
