//! Model-provider capability used by every pipeline role.

mod http;
mod offline;
mod retry;

use async_trait::async_trait;
use thiserror::Error;

pub use http::AIClient;
pub use offline::OfflineClient;
pub use retry::RateLimitRetry;

/// Appended to the system prompt whenever structured output is requested.
pub const STRUCTURED_OUTPUT_SUFFIX: &str = "\n\nIMPORTANT: Output valid JSON only.";

/// Text completion over a (system, user) prompt pair.
///
/// With `structured` set, the provider is asked to bias the model toward a
/// single JSON object. Throttling must surface as `ProviderError::RateLimited`
/// so a wrapper can decide to wait and retry.
#[async_trait]
pub trait LlmClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        structured: bool,
    ) -> Result<String, ProviderError>;
}

pub type DynLlmClient = dyn LlmClient + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("invalid API key, check your API key configuration")]
    Unauthorized,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("service is temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("request to provider failed: {0}")]
    Transport(String),
    #[error("provider returned no content")]
    EmptyResponse,
}

impl ProviderError {
    pub fn is_throttled(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }
}
