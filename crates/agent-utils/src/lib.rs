//! Shared utilities for the portfolio agents workspace
//!
//! Logging setup and application-level configuration used by the binaries.

pub mod config;
pub mod logging;

pub use config::{Config, LogFormat};
pub use logging::{init_from_config, init_tracing, init_tracing_json};
