use anyhow::{Result, anyhow, bail};

use super::types::Config;

pub fn validate(config: &Config) -> Result<()> {
    if config.workspace.test_command.is_empty()
        || config.workspace.test_command[0].trim().is_empty()
    {
        bail!("Test command must not be empty");
    }
    if config.workspace.test_timeout_secs == 0 {
        bail!("Test timeout must be a positive number of seconds");
    }
    if config.retry.max_attempts == 0 {
        bail!("Retry attempts must be at least 1");
    }
    Ok(())
}

pub fn validate_credentials(config: &Config) -> Result<()> {
    if config.llm.api_key.trim().is_empty() {
        let provider = config.llm.provider;
        let env_var = provider.api_key_env_var();
        Err(anyhow!(
            "{} API key not found. Set {} or add it to {}",
            provider.display_name(),
            env_var,
            Config::config_path()?.display()
        ))
    } else {
        Ok(())
    }
}
