pub mod run;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::EntityCatalog;
use crate::pipeline::SEED_SET;

/// Definitions from `path`, or the bundled ones
pub fn load_catalog(path: Option<&Path>, seeds: &[&str]) -> Result<EntityCatalog> {
    match path {
        Some(path) => EntityCatalog::load(path, seeds),
        None => EntityCatalog::bundled(seeds).context("Bundled entity definitions are invalid"),
    }
}

pub fn default_seeds() -> [&'static str; 1] {
    [SEED_SET]
}
