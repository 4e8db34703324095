use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::agent::Pipeline;
use crate::client::{AIClient, DynLlmClient, OfflineClient, RateLimitRetry};
use crate::config::{Config, LlmProvider};
use crate::exec::CommandTestRunner;
use crate::workspace::Workspace;

use super::args::Cli;
use super::report;

pub(crate) async fn run(cli: Cli, mut config: Config) -> Result<bool> {
    apply_overrides(&cli, &mut config)?;

    let goal = match cli.goal {
        Some(goal) => goal,
        None => prompt_for_goal()?,
    };
    let goal = goal.trim().to_owned();
    if goal.is_empty() {
        bail!("Goal cannot be empty. Usage: triad --goal \"describe the function\"");
    }

    let client = build_client(&config, cli.mock)?;
    let runner = Arc::new(CommandTestRunner::new(
        &config.workspace.test_command,
        Duration::from_secs(config.workspace.test_timeout_secs),
    ));
    let workspace = Workspace::new(&config.workspace.dir);

    report::render_header(&goal, &config, cli.mock);
    let pipeline = Pipeline::new(client, runner, workspace);
    let run = pipeline.run(&goal).await;
    report::render_run(&run);

    Ok(run.succeeded())
}

fn apply_overrides(cli: &Cli, config: &mut Config) -> Result<()> {
    if let Some(provider_arg) = &cli.provider {
        let provider: LlmProvider = provider_arg.parse()?;
        if provider != config.llm.provider {
            config.llm.switch_provider(provider);
            config.llm.api_key = std::env::var(provider.api_key_env_var()).unwrap_or_default();
        }
    }

    if let Some(model) = &cli.model {
        config.llm.model = model.trim().to_owned();
    }

    if let Some(dir) = &cli.workspace {
        config.workspace.dir = dir.clone();
    }

    if let Some(command) = &cli.test_command {
        config.workspace.test_command = command.split_whitespace().map(str::to_string).collect();
    }

    config.validate()
}

fn build_client(config: &Config, mock: bool) -> Result<Arc<DynLlmClient>> {
    if mock {
        info!("using offline provider");
        return Ok(Arc::new(OfflineClient::new()));
    }

    config.validate_credentials()?;
    let http = AIClient::new(&config.llm).context("Failed to build provider client")?;
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        "using live provider"
    );
    Ok(Arc::new(RateLimitRetry::new(
        Arc::new(http),
        config.retry.max_attempts,
        Duration::from_secs(config.retry.base_delay_secs),
    )))
}

fn prompt_for_goal() -> Result<String> {
    print!("Enter your goal: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read goal from stdin")?;
    Ok(input)
}
