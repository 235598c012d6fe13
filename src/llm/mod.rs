pub mod capability;
pub mod middleware;
#[cfg(any(test, feature = "test-support"))]
pub mod mock;
pub mod openai;
pub mod types;

pub use capability::{ModelFamily, ModelRouting, Parameter};
pub use middleware::TemperatureGuard;
pub use types::{ChatMessage, ChatRequest, ResponseFormat, Role, StreamChunk};

use std::sync::Arc;

/// LLM call errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Stream error: {0}")]
    Stream(String),
}

/// Chat-completion capability - the single seam every agent talks to
#[async_trait::async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Run one completion and return the full reply text
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError>;
}

#[async_trait::async_trait]
impl<C: ChatCompletion + ?Sized> ChatCompletion for Arc<C> {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        (**self).complete(request).await
    }
}
