//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// Core trait that all analysis agents implement
///
/// Agents exchange JSON documents encoded as strings so that heterogeneous
/// producers (fundamental, technical, sentiment, macro analysts and the
/// portfolio agents in this workspace) can be chained without sharing types.
/// A well-behaved agent returns a serialized `AgentOutput` or a rendered
/// report, depending on its role.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process a JSON input document and return the agent's output
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Get the agent's name
    fn name(&self) -> &str;

    /// One-line description shown by front-ends
    fn description(&self) -> &str {
        ""
    }
}
