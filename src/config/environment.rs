use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::PathBuf;

use super::builder::ConfigBuilder;
use super::types::LlmProvider;

pub fn apply_env_overrides(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Some(provider_raw) = env_string("TRIAD_PROVIDER")? {
        let provider = provider_raw
            .parse::<LlmProvider>()
            .with_context(|| format!("Failed to parse TRIAD_PROVIDER value '{provider_raw}'"))?;
        builder = builder.with_llm(|llm| llm.switch_provider(provider));
    } else if builder.llm.api_key.trim().is_empty() {
        if let Some(provider) = detect_provider()? {
            builder = builder.with_llm(|llm| llm.switch_provider(provider));
        }
    }

    let provider = builder.llm.provider;
    if let Some(api_key) = env_string(provider.api_key_env_var())? {
        builder = builder.with_llm(|llm| llm.api_key = api_key);
    }

    if let Some(model) = env_string("TRIAD_MODEL")? {
        builder = builder.with_llm(|llm| llm.model = model);
    }

    if let Some(base_url) = env_string("TRIAD_BASE_URL")? {
        builder = builder.with_llm(|llm| llm.base_url = base_url);
    }

    if let Some(timeout) = env_u64("TRIAD_TIMEOUT_SECS")? {
        builder = builder.with_llm(|llm| llm.timeout_secs = timeout);
    }

    if let Some(max_tokens) = env_u32("TRIAD_MAX_TOKENS")? {
        builder = builder.with_llm(|llm| llm.max_tokens = max_tokens);
    }

    if let Some(dir) = env_string("TRIAD_WORKSPACE")? {
        builder = builder.with_workspace(|workspace| workspace.dir = PathBuf::from(dir));
    }

    if let Some(command) = env_string("TRIAD_TEST_COMMAND")? {
        let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        builder = builder.with_workspace(|workspace| workspace.test_command = parts);
    }

    if let Some(timeout) = env_u64("TRIAD_TEST_TIMEOUT_SECS")? {
        builder = builder.with_workspace(|workspace| workspace.test_timeout_secs = timeout);
    }

    Ok(builder)
}

/// First provider, in detection order, whose API key variable is set.
fn detect_provider() -> Result<Option<LlmProvider>> {
    for provider in LlmProvider::DETECTION_ORDER {
        if let Some(key) = env_string(provider.api_key_env_var())? {
            if !key.trim().is_empty() {
                return Ok(Some(provider));
            }
        }
    }
    Ok(None)
}

pub fn env_string(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(anyhow!("{key} contains invalid UTF-8")),
    }
}

pub fn env_u64(key: &str) -> Result<Option<u64>> {
    if let Some(value) = env_string(key)? {
        let parsed = value
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {key} as u64"))?;
        Ok(Some(parsed))
    } else {
        Ok(None)
    }
}

pub fn env_u32(key: &str) -> Result<Option<u32>> {
    if let Some(value) = env_string(key)? {
        let parsed = value
            .parse::<u32>()
            .with_context(|| format!("Failed to parse {key} as u32"))?;
        Ok(Some(parsed))
    } else {
        Ok(None)
    }
}
