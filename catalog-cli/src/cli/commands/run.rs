//! `run` command handler

use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use colored::*;

use super::{default_seeds, load_catalog};
use crate::api::SalesforceClient;
use crate::cli::RunArgs;
use crate::config::AppConfig;
use crate::output::ArtifactWriter;
use crate::pipeline::{Pipeline, RunOptions, RunOutcome};

/// Merge command line overrides into the loaded config
fn apply_overrides(mut config: AppConfig, args: &RunArgs) -> AppConfig {
    if let Some(product_id) = &args.product_id {
        config.product_id = Some(product_id.clone());
    }
    if let Some(days) = args.days {
        config.number_of_days = days;
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(entities) = &args.entities {
        config.entities_file = Some(entities.clone());
    }
    if let Some(timezone) = &args.timezone {
        config.timezone = timezone.clone();
    }
    config
}

pub async fn handle_run_command(args: RunArgs) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let config = AppConfig::load(args.config.as_deref())?.with_process_env();
    let config = apply_overrides(config, &args);

    // Everything that can fail without the org is checked first
    let catalog = load_catalog(config.entities_file.as_deref(), &default_seeds())?;
    let product_id = config.product_id()?.to_string();
    let timezone = config.timezone()?;
    let client = SalesforceClient::new(
        config.instance_url()?,
        config.connection.api_version.clone(),
        config.access_token()?,
        config.retry.clone(),
    )?;

    let now = Utc::now();
    let cutoff = config.cutoff(now);

    println!(
        "Connecting to {} for product {}",
        client.instance_url().bright_green(),
        product_id.bold()
    );
    println!(
        "Changes since {} ({} days)",
        cutoff.format("%Y-%m-%d %H:%M:%SZ").to_string().cyan(),
        config.number_of_days
    );

    let start = Instant::now();
    let options = RunOptions::new(&product_id, cutoff).with_timezone(timezone);
    let outcome = Pipeline::new(&client, &catalog)
        .run(&options)
        .await
        .context("Catalog run failed")?;
    let elapsed = start.elapsed();

    let writer = ArtifactWriter::create(&config.output_dir, now)?;
    let written = writer.write_outcome(&product_id, &outcome)?;

    print_summary(&outcome, args.verbose);
    println!();
    println!(
        "{} files written to {}",
        written.len(),
        writer.dir().display().to_string().bright_green()
    );
    println!("Total time: {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

fn print_summary(outcome: &RunOutcome, verbose: bool) {
    let width = outcome
        .results
        .iter()
        .map(|(entity, _)| entity.len())
        .max()
        .unwrap_or(6)
        .max("Entity".len());

    println!();
    println!("{:<width$}  {:>7}", "Entity".bold().magenta(), "Rows".bold().magenta(), width = width);
    for (entity, count) in outcome.results.counts() {
        let rows = if count == 0 {
            count.to_string().dimmed()
        } else {
            count.to_string().normal()
        };
        println!("{:<width$}  {:>7}", entity.cyan(), rows, width = width);
    }

    println!();
    println!(
        "Products in closure: {}  Supplemental lookups: {}",
        outcome.product_ids.len(),
        outcome.supplemental_products
    );
    println!(
        "Tracked entities: {}  Changed records: {}  Changes: {}",
        outcome.history.tracked.len(),
        outcome.history.by_owner.len(),
        outcome.history.total_changes().to_string().yellow()
    );

    if outcome.history.is_empty() {
        println!("{}", "No field changes since the cutoff".dimmed());
    }

    if verbose {
        for activity in &outcome.history.activity {
            println!(
                "  {:<width$}  {:>5} modified  {:>5} changes",
                activity.entity,
                activity.recently_modified,
                activity.changes,
                width = width
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_overrides_win_over_config() {
        let args = RunArgs {
            config: None,
            product_id: Some("01tCLI".into()),
            days: Some(30),
            output_dir: None,
            entities: Some(PathBuf::from("custom.toml")),
            timezone: None,
            no_color: false,
            verbose: false,
        };
        let config = AppConfig {
            product_id: Some("01tFILE".into()),
            timezone: "Europe/Paris".into(),
            ..AppConfig::default()
        };

        let merged = apply_overrides(config, &args);
        assert_eq!(merged.product_id.as_deref(), Some("01tCLI"));
        assert_eq!(merged.number_of_days, 30);
        assert_eq!(merged.timezone, "Europe/Paris");
        assert_eq!(merged.output_dir, PathBuf::from("output"));
        assert_eq!(merged.entities_file, Some(PathBuf::from("custom.toml")));
    }
}
