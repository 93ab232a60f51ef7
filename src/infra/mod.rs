//! Infrastructure adapters and runtime bootstrap.

pub mod clock;
pub mod error;
pub mod session_store;
pub mod telemetry;
