//! `validate` command handler

use anyhow::Result;
use colored::*;

use super::load_catalog;
use crate::cli::ValidateArgs;

pub fn handle_validate_command(args: ValidateArgs) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let seeds: Vec<&str> = args.seeds.iter().map(String::as_str).collect();
    let catalog = load_catalog(args.entities.as_deref(), &seeds)?;

    let source = args
        .entities
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "bundled definitions".to_string());
    println!(
        "{} {} entities in {}",
        "Valid:".bright_green().bold(),
        catalog.len(),
        source
    );
    println!("Seed sets: {}", seeds.join(", ").cyan());
    println!();

    for (position, definition) in catalog.definitions().iter().enumerate() {
        let reads = definition.referenced_sets();
        let writes = definition.produced_sets();
        println!(
            "{:>3}. {}  {} {}  {} {}",
            position + 1,
            definition.name.bold(),
            "reads".dimmed(),
            if reads.is_empty() { "-".to_string() } else { reads.join(",") },
            "writes".dimmed(),
            if writes.is_empty() { "-".to_string() } else { writes.join(",") },
        );
    }

    Ok(())
}
