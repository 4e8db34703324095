use anyhow::Result;

use super::types::{Config, LlmSettings, RetrySettings, WorkspaceSettings};

#[derive(Debug)]
pub struct ConfigBuilder {
    pub(super) llm: LlmSettings,
    pub(super) workspace: WorkspaceSettings,
    pub(super) retry: RetrySettings,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            llm: LlmSettings::default(),
            workspace: WorkspaceSettings::default(),
            retry: RetrySettings::default(),
        }
    }

    pub fn with_llm<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut LlmSettings),
    {
        update(&mut self.llm);
        self
    }

    pub fn with_workspace<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut WorkspaceSettings),
    {
        update(&mut self.workspace);
        self
    }

    pub fn with_retry<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut RetrySettings),
    {
        update(&mut self.retry);
        self
    }

    pub fn build(self) -> Result<Config> {
        Ok(Config {
            llm: self.llm,
            workspace: self.workspace,
            retry: self.retry,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
