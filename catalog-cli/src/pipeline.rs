//! One catalog run: closure, ordered retrieval, history, hierarchy

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::info;

use crate::api::QueryPort;
use crate::catalog::{CHUNK_SIZE, CatalogSets};
use crate::config::EntityCatalog;
use crate::engine::{ClosureResolver, EntityResults, RetrievalEngine};
use crate::history::{HistoryCollector, HistoryReport};
use crate::hierarchy::{
    CalculationListing, HierarchyAssembler, HierarchyIndex, ProductNode, ProductPricing,
    pricing_by_product,
};

/// Set seeded with the root product's closure
pub const SEED_SET: &str = "product_ids";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub product_id: String,
    pub cutoff: DateTime<Utc>,
    pub timezone: Tz,
    pub chunk_size: usize,
}

impl RunOptions {
    pub fn new(product_id: impl Into<String>, cutoff: DateTime<Utc>) -> Self {
        Self {
            product_id: product_id.into(),
            cutoff,
            timezone: Tz::UTC,
            chunk_size: CHUNK_SIZE,
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

}

/// Everything a run produces
#[derive(Debug)]
pub struct RunOutcome {
    pub product_ids: BTreeSet<String>,
    pub sets: CatalogSets,
    pub results: EntityResults,
    pub history: HistoryReport,
    pub hierarchy: Vec<ProductNode>,
    pub pricing: Vec<ProductPricing>,
    pub calculations: CalculationListing,
    pub supplemental_products: usize,
}

pub struct Pipeline<'a> {
    port: &'a dyn QueryPort,
    catalog: &'a EntityCatalog,
}

impl<'a> Pipeline<'a> {
    pub fn new(port: &'a dyn QueryPort, catalog: &'a EntityCatalog) -> Self {
        Self { port, catalog }
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunOutcome> {
        info!("Resolving product closure of {}", options.product_id);
        let product_ids = ClosureResolver::new(self.port)
            .with_chunk_size(options.chunk_size)
            .resolve(&options.product_id)
            .await?;

        let mut sets = CatalogSets::new();
        sets.add_all(SEED_SET, product_ids.iter().cloned());

        info!("Retrieving {} entities", self.catalog.len());
        let mut results = EntityResults::new();
        RetrievalEngine::new(self.port)
            .with_chunk_size(options.chunk_size)
            .run_all(self.catalog.definitions(), &mut sets, &mut results)
            .await?;

        info!("Collecting changes since {}", options.cutoff.format("%Y-%m-%d %H:%M:%SZ"));
        let history = HistoryCollector::new(self.port)
            .with_timezone(options.timezone)
            .with_chunk_size(options.chunk_size)
            .collect(self.catalog.definitions(), &results, options.cutoff)
            .await?;

        let (hierarchy, supplemental_products) = {
            let mut index = HierarchyIndex::build(&results);
            let fetched = index
                .fill_missing_products(self.port, options.chunk_size)
                .await?;
            let roots = HierarchyAssembler::new(&index).build([options.product_id.as_str()]);
            (roots, fetched)
        };
        let pricing = pricing_by_product(&hierarchy);
        let calculations = CalculationListing::from_results(&results);

        info!(
            "Run complete: {} products, {} records, {} changes",
            product_ids.len(),
            results.total_records(),
            history.total_changes()
        );

        Ok(RunOutcome {
            product_ids,
            sets,
            results,
            history,
            hierarchy,
            pricing,
            calculations,
            supplemental_products,
        })
    }
}
