mod api;
mod catalog;
mod cli;
mod config;
mod engine;
mod hierarchy;
mod history;
mod output;
mod pipeline;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;

use cli::commands::run::handle_run_command;
use cli::commands::validate::handle_validate_command;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => handle_run_command(args).await,
        Commands::Validate(args) => handle_validate_command(args),
    }
}
