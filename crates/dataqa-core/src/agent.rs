//! The agent seam: one capability, answer a question about the bound dataset.

use crate::config::AppConfig;
use crate::error::Result;
use std::sync::Arc;

/// Question answering over the bound dataset.
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    /// Short name for logs and the status endpoint.
    fn name(&self) -> &str;

    /// Answer `question`. Failures come back as `DataQaError::AgentInvocation`.
    async fn invoke(&self, question: &str) -> Result<String>;
}

/// Builds the agent for a session. Called at most once per session.
pub trait AgentFactory: Send + Sync {
    fn build(&self, config: &AppConfig) -> Result<Arc<dyn Agent>>;
}
