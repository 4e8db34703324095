use anyhow::{Context, Result};
use dirs::home_dir;
use std::{fs, path::Path};
use tracing::warn;

use super::builder::ConfigBuilder;
use super::constants::CONFIG_RELATIVE_PATH;
use super::environment::apply_env_overrides;
use super::types::{FileConfig, LlmProvider};
use super::validation::{validate, validate_credentials};
use super::Config;

impl Config {
    pub fn config_path() -> Result<std::path::PathBuf> {
        let mut path = home_dir().context("Could not determine home directory")?;
        path.push(CONFIG_RELATIVE_PATH);
        Ok(path)
    }

    /// Defaults, then `~/.triad/config.json`, then environment overrides.
    ///
    /// Credentials are not checked here; the offline provider needs none.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut builder = ConfigBuilder::new();

        if path.exists() {
            builder = Self::apply_file(builder, &path)?;
        }

        builder = apply_env_overrides(builder)?;

        let config = builder.build()?;
        validate(&config)?;
        Ok(config)
    }

    /// `load`, falling back to defaults when the file or home directory is
    /// unusable. Only the offline stand-in runs this way.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            warn!(error = %format!("{err:#}"), "ignoring configuration, using defaults");
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<()> {
        validate(self)
    }

    pub fn validate_credentials(&self) -> Result<()> {
        validate_credentials(self)
    }

    fn apply_file(builder: ConfigBuilder, path: &Path) -> Result<ConfigBuilder> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed reading config at {}", path.display()))?;

        if contents.trim().is_empty() {
            return Ok(builder);
        }

        let file: FileConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed parsing JSON config at {}", path.display()))?;

        file.apply(builder)
            .with_context(|| format!("Invalid config at {}", path.display()))
    }
}

impl FileConfig {
    pub fn apply(self, builder: ConfigBuilder) -> Result<ConfigBuilder> {
        let mut builder = builder;

        if let Some(llm_file) = self.llm {
            let provider = llm_file
                .provider
                .as_deref()
                .map(str::parse::<LlmProvider>)
                .transpose()?;
            builder = builder.with_llm(|llm| {
                if let Some(provider) = provider {
                    llm.switch_provider(provider);
                }
                if let Some(api_key) = llm_file.api_key {
                    llm.api_key = api_key;
                }
                if let Some(model) = llm_file.model {
                    llm.model = model;
                }
                if let Some(base_url) = llm_file.base_url {
                    llm.base_url = base_url;
                }
                if let Some(timeout) = llm_file.timeout_secs {
                    llm.timeout_secs = timeout;
                }
                if let Some(max_tokens) = llm_file.max_tokens {
                    llm.max_tokens = max_tokens;
                }
                if let Some(temperature) = llm_file.temperature {
                    llm.temperature = temperature;
                }
                if let Some(user_agent) = llm_file.user_agent {
                    llm.user_agent = user_agent;
                }
            });
        }

        if let Some(workspace_file) = self.workspace {
            builder = builder.with_workspace(|workspace| {
                if let Some(dir) = workspace_file.dir {
                    workspace.dir = dir;
                }
                if let Some(command) = workspace_file.test_command {
                    workspace.test_command = command;
                }
                if let Some(timeout) = workspace_file.test_timeout_secs {
                    workspace.test_timeout_secs = timeout;
                }
            });
        }

        if let Some(retry_file) = self.retry {
            builder = builder.with_retry(|retry| {
                if let Some(max_attempts) = retry_file.max_attempts {
                    retry.max_attempts = max_attempts;
                }
                if let Some(delay) = retry_file.base_delay_secs {
                    retry.base_delay_secs = delay;
                }
            });
        }

        Ok(builder)
    }
}
