use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{DynLlmClient, LlmClient, ProviderError};

/// Wraps a provider and waits out rate limits before giving up.
///
/// Attempt `n` (zero-based) that is throttled sleeps
/// `base_delay * (n + 1) + extra_delay` before the next try. Every other
/// error is returned untouched.
pub struct RateLimitRetry {
    inner: Arc<DynLlmClient>,
    max_attempts: u32,
    base_delay: Duration,
    extra_delay: Duration,
}

impl RateLimitRetry {
    pub fn new(inner: Arc<DynLlmClient>, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
            extra_delay: Duration::from_secs(10),
        }
    }

    pub fn with_extra_delay(mut self, extra_delay: Duration) -> Self {
        self.extra_delay = extra_delay;
        self
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1) + self.extra_delay
    }
}

#[async_trait]
impl LlmClient for RateLimitRetry {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        structured: bool,
    ) -> Result<String, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(system, user, structured).await {
                Err(err) if err.is_throttled() && attempt + 1 < self.max_attempts => {
                    let wait = self.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        wait_secs = wait.as_secs(),
                        "provider rate limit hit, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
