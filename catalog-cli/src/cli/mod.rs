//! Command line interface

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "catalog-cli", version, about = "Detect recent product catalog changes in a Salesforce org")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve a product's catalog, its recent changes and write the artifacts
    Run(RunArgs),
    /// Check entity definitions without contacting the org
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Config file (defaults to ~/.config/catalog-cli/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Root product id, overrides the config
    #[arg(short, long)]
    pub product_id: Option<String>,

    /// Change window in days, overrides the config
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Output directory, overrides the config
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Entity definitions file, overrides the config and the bundled set
    #[arg(short, long)]
    pub entities: Option<PathBuf>,

    /// Timezone for timestamps without offset (e.g., Europe/Brussels)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print per-entity history activity
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Entity definitions file (defaults to the bundled set)
    #[arg(short, long)]
    pub entities: Option<PathBuf>,

    /// Sets populated before the first entity runs
    #[arg(long = "seed", default_value = "product_ids")]
    pub seeds: Vec<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::try_parse_from([
            "catalog-cli",
            "run",
            "--product-id",
            "01t1",
            "--days",
            "3",
            "--timezone",
            "Europe/Brussels",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.product_id.as_deref(), Some("01t1"));
                assert_eq!(args.days, Some(3));
                assert_eq!(args.timezone.as_deref(), Some("Europe/Brussels"));
                assert!(args.config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validate_default_seed() {
        let cli = Cli::try_parse_from(["catalog-cli", "validate"]).unwrap();
        match cli.command {
            Commands::Validate(args) => assert_eq!(args.seeds, vec!["product_ids"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
