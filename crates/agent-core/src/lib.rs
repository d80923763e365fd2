//! Core abstractions shared by the portfolio agents
//!
//! This crate defines the [`Agent`] trait every analysis agent implements, the
//! per-request [`Context`] passed between them, and the common error type.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, Result};
