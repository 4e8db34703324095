use std::path::PathBuf;

use super::constants::*;
use super::types::{Config, LlmProvider, LlmSettings, RetrySettings, WorkspaceSettings};

pub fn default_user_agent() -> String {
    format!("triad/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for LlmSettings {
    fn default() -> Self {
        let provider = LlmProvider::OpenAi;
        Self {
            provider,
            api_key: String::new(),
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_WORKSPACE_DIR),
            test_command: vec![DEFAULT_TEST_COMMAND.to_string()],
            test_timeout_secs: DEFAULT_TEST_TIMEOUT_SECS,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay_secs: DEFAULT_RETRY_BASE_DELAY_SECS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            workspace: WorkspaceSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}
