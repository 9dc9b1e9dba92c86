//! JSON artifacts of a run, written under a timestamped folder

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::pipeline::RunOutcome;

pub const RUN_FOLDER_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub fn run_folder_name(now: DateTime<Utc>) -> String {
    now.format(RUN_FOLDER_FORMAT).to_string()
}

#[derive(Serialize)]
struct RunSummary<'a> {
    product_id: &'a str,
    product_ids: Vec<&'a str>,
    cutoff: Option<DateTime<Utc>>,
    entities: Vec<(String, usize)>,
    catalog_sets: BTreeMap<&'a str, usize>,
    total_records: usize,
    hierarchy_nodes: usize,
    supplemental_products: usize,
    total_changes: usize,
}

pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Create `<base>/<timestamp>`
    pub fn create(base: &Path, now: DateTime<Utc>) -> Result<Self> {
        let dir = base.join(run_folder_name(now));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        let content = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {}", file_name))?;
        fs::write(&path, content).with_context(|| format!("Failed to write: {}", path.display()))?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// One file per entity plus the assembled views
    pub fn write_outcome(&self, root_product: &str, outcome: &RunOutcome) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for (entity, records) in outcome.results.iter() {
            written.push(self.write_json(&format!("{}.json", entity), records)?);
        }

        written.push(self.write_json("hierarchy.json", &outcome.hierarchy)?);
        written.push(self.write_json("history.json", &outcome.history)?);
        written.push(self.write_json("pricing.json", &outcome.pricing)?);
        written.push(self.write_json("calculations.json", &outcome.calculations)?);

        let summary = RunSummary {
            product_id: root_product,
            product_ids: outcome.product_ids.iter().map(String::as_str).collect(),
            cutoff: outcome.history.cutoff,
            entities: outcome.results.counts(),
            catalog_sets: outcome
                .sets
                .names()
                .into_iter()
                .map(|name| (name, outcome.sets.len(name)))
                .collect(),
            total_records: outcome.results.total_records(),
            hierarchy_nodes: outcome.hierarchy.iter().map(|node| node.size()).sum(),
            supplemental_products: outcome.supplemental_products,
            total_changes: outcome.history.total_changes(),
        };
        written.push(self.write_json("summary.json", &summary)?);

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSets;
    use crate::engine::EntityResults;
    use crate::hierarchy::CalculationListing;
    use crate::history::HistoryReport;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn test_run_folder_name() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 3).unwrap();
        assert_eq!(run_folder_name(now), "20240501T090503Z");
    }

    #[test]
    fn test_write_outcome() {
        let temp = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 3).unwrap();
        let writer = ArtifactWriter::create(temp.path(), now).unwrap();

        let mut results = EntityResults::new();
        results.insert("Product2", vec![json!({"Id": "root"})]);
        results.insert("Rule", vec![]);
        let mut sets = CatalogSets::new();
        sets.add_all("product_ids", ["root"]);
        sets.add_all("product2_ids", ["root"]);
        sets.add_all("rule_ids", Vec::<String>::new());
        let outcome = RunOutcome {
            product_ids: BTreeSet::from(["root".to_string()]),
            sets,
            results,
            history: HistoryReport::default(),
            hierarchy: Vec::new(),
            pricing: Vec::new(),
            calculations: CalculationListing::default(),
            supplemental_products: 0,
        };

        let written = writer.write_outcome("root", &outcome).unwrap();

        assert_eq!(written.len(), 7);
        assert!(writer.dir().ends_with("20240501T090503Z"));
        let products: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(writer.dir().join("Product2.json")).unwrap())
                .unwrap();
        assert_eq!(products, json!([{"Id": "root"}]));

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(writer.dir().join("summary.json")).unwrap())
                .unwrap();
        assert_eq!(summary["entities"], json!([["Product2", 1], ["Rule", 0]]));
        assert_eq!(summary["total_records"], 1);
        assert_eq!(
            summary["catalog_sets"],
            json!({"product2_ids": 1, "product_ids": 1, "rule_ids": 0})
        );
        assert_eq!(summary["hierarchy_nodes"], 0);
    }
}
