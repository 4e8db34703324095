use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::Config;

use super::commands;

/// Entry point for the `triad` command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "triad",
    about = "Plan a Python module, plant a bug, test it, fix it and verify the fix",
    version,
    long_about = None
)]
pub struct Cli {
    /// What the generated module should do (prompted for when omitted)
    #[arg(short = 'g', long = "goal")]
    pub goal: Option<String>,

    /// Use the offline stand-in instead of a live provider
    #[arg(long = "mock")]
    pub mock: bool,

    /// Directory the module, its snapshots and tests are written to
    #[arg(short = 'w', long = "workspace")]
    pub workspace: Option<PathBuf>,

    /// Select the LLM provider (openai, gemini or openrouter)
    #[arg(long = "provider")]
    pub provider: Option<String>,

    /// Override the model
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Command used to run the tests, e.g. "python -m pytest -q"
    #[arg(long = "test-command")]
    pub test_command: Option<String>,

    /// Enable debug logging, including prompts and raw responses
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Returns whether the final verdict passed.
    pub async fn run(self, config: Config) -> Result<bool> {
        commands::run(self, config).await
    }
}
