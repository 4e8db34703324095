mod agent;
mod cli;
mod client;
mod config;
mod contract;
mod error;
mod exec;
mod logging;
mod roles;
mod schema;
mod source;
mod workspace;

use anyhow::Result;
use clap::Parser;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);

    let config = if cli.mock {
        Config::load_or_default()
    } else {
        Config::load()?
    };
    if !cli.run(config).await? {
        std::process::exit(1);
    }
    Ok(())
}
