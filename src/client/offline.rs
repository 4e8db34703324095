use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::roles::{RoleKind, failure_marker};

use super::{LlmClient, ProviderError};

const BUGGY_FACTORIAL: &str = "def factorial(n):\n    if n < 0:\n        raise ValueError('n must be >= 0')\n    # Base case returns 0 instead of 1, so every result collapses to 0\n    if n == 0:\n        return 0\n    return n * factorial(n - 1)\n";

const FIXED_FACTORIAL: &str = "def factorial(n):\n    if n < 0:\n        raise ValueError('n must be >= 0')\n    if n == 0:\n        return 1\n    return n * factorial(n - 1)\n";

const FACTORIAL_TESTS: &str = "import pytest\nfrom math_ops import factorial\n\n\ndef test_factorial_success():\n    assert factorial(5) == 120\n    assert factorial(0) == 1\n\n\ndef test_factorial_error():\n    with pytest.raises(ValueError):\n        factorial(-1)\n";

/// Deterministic stand-in for a live provider.
///
/// Answers are keyed on which role's system prompt it receives and always
/// describe the factorial task, so a whole pipeline run works without network
/// access. The call counter belongs to the instance.
#[derive(Debug, Default)]
pub struct OfflineClient {
    calls: AtomicUsize,
}

impl OfflineClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn judge(test_output: &str) -> serde_json::Value {
        if test_output.contains("E ") || failure_marker(test_output).is_some() {
            json!({ "success": false, "reason": "Tests failed with errors." })
        } else {
            json!({ "success": true, "reason": "All tests passed." })
        }
    }
}

#[async_trait]
impl LlmClient for OfflineClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        _structured: bool,
    ) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let role = RoleKind::identify(system);
        debug!(call, role = ?role, "offline provider answering");

        let answer = match role {
            Some(RoleKind::Plan) => json!({
                "filename": "math_ops.py",
                "function_name": "factorial",
                "description": "Calculate the factorial of a non-negative integer. Raises ValueError if n < 0.",
                "steps": [
                    "Check if n is less than 0, raise ValueError if so.",
                    "If n is 0, return 1.",
                    "Otherwise return n * factorial(n-1)."
                ]
            }),
            Some(RoleKind::Code) => json!({ "file_content": BUGGY_FACTORIAL }),
            Some(RoleKind::TestAuthor) => json!({ "test_content": FACTORIAL_TESTS }),
            Some(RoleKind::Judge) => Self::judge(user),
            Some(RoleKind::Fix) => json!({ "file_content": FIXED_FACTORIAL }),
            None => json!({}),
        };
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{CODER_SYSTEM_PROMPT, JUDGE_SYSTEM_PROMPT};

    #[tokio::test]
    async fn counter_is_per_instance() {
        let first = OfflineClient::new();
        let second = OfflineClient::new();

        first.complete(CODER_SYSTEM_PROMPT, "", true).await.unwrap();
        first.complete(CODER_SYSTEM_PROMPT, "", true).await.unwrap();
        second.complete(CODER_SYSTEM_PROMPT, "", true).await.unwrap();

        assert_eq!(first.call_count(), 2);
        assert_eq!(second.call_count(), 1);
    }

    #[tokio::test]
    async fn judge_answer_follows_failure_markers() {
        let client = OfflineClient::new();

        let failing = client
            .complete(JUDGE_SYSTEM_PROMPT, "Pytest Output:\n1 failed, 1 passed", true)
            .await
            .unwrap();
        let passing = client
            .complete(JUDGE_SYSTEM_PROMPT, "Pytest Output:\n2 passed in 0.01s", true)
            .await
            .unwrap();

        assert!(failing.contains("\"success\":false"));
        assert!(passing.contains("\"success\":true"));
    }

    #[tokio::test]
    async fn judge_answer_fails_runs_that_never_finished() {
        let client = OfflineClient::new();

        let answer = client
            .complete(
                JUDGE_SYSTEM_PROMPT,
                "Pytest Output:\n[test command timed out after 120s]\n",
                true,
            )
            .await
            .unwrap();

        assert!(answer.contains("\"success\":false"));
    }

    #[tokio::test]
    async fn unknown_role_gets_empty_object() {
        let client = OfflineClient::new();
        let answer = client.complete("You are a poet.", "", true).await.unwrap();
        assert_eq!(answer, "{}");
    }
}
