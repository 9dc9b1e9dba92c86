//! Entity retrieval engine
//!
//! Runs entity definitions in order. Each step expands its where-template
//! against the current catalog sets, executes the resulting queries one after
//! another, dedups the merged rows and projects configured fields back into
//! the sets for later steps.

use anyhow::{Context, Result};
use log::{debug, info};

use super::results::{EntityResults, dedupe_by_id};
use crate::api::QueryPort;
use crate::catalog::{CHUNK_SIZE, CatalogSets, build_query, expand_template, record_id, resolve_path};
use crate::config::EntityDefinition;

pub struct RetrievalEngine<'a> {
    port: &'a dyn QueryPort,
    chunk_size: usize,
}

impl<'a> RetrievalEngine<'a> {
    pub fn new(port: &'a dyn QueryPort) -> Self {
        Self {
            port,
            chunk_size: CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Queries a definition would issue against the current sets
    ///
    /// Any-of alternatives whose gating set is empty are skipped. A
    /// definition without where-templates issues its base query once.
    pub fn prepare_queries(&self, definition: &EntityDefinition, sets: &CatalogSets) -> Vec<String> {
        let clauses: Vec<String> = if !definition.where_any_of.is_empty() {
            definition
                .where_any_of
                .iter()
                .filter(|alt| {
                    let gated = sets.get(&alt.if_set).is_empty();
                    if gated {
                        debug!("{}: set '{}' is empty, skipping alternative", definition.name, alt.if_set);
                    }
                    !gated
                })
                .flat_map(|alt| expand_template(&alt.where_clause, sets, self.chunk_size))
                .collect()
        } else {
            match definition.where_clause.as_deref() {
                Some(template) if !template.trim().is_empty() => {
                    expand_template(template, sets, self.chunk_size)
                }
                _ => return vec![build_query(&definition.base, "")],
            }
        };

        clauses
            .iter()
            .map(|clause| build_query(&definition.base, clause))
            .collect()
    }

    /// Retrieve, dedup, store and project one entity
    pub async fn process_entity<'r>(
        &self,
        definition: &EntityDefinition,
        sets: &mut CatalogSets,
        results: &'r mut EntityResults,
    ) -> Result<&'r [serde_json::Value]> {
        let queries = self.prepare_queries(definition, sets);
        if queries.is_empty() {
            debug!("{}: no dependency values, nothing to query", definition.name);
        }

        let mut merged = Vec::new();
        for soql in &queries {
            let rows = self
                .port
                .query(soql)
                .await
                .with_context(|| format!("Failed to retrieve {} with query: {}", definition.name, soql))?;
            merged.extend(rows);
        }

        let fetched = merged.len();
        let records = dedupe_by_id(merged);
        if fetched != records.len() {
            debug!(
                "{}: dropped {} duplicate rows",
                definition.name,
                fetched - records.len()
            );
        }

        project(definition, &records, sets);
        results.insert(definition.name.clone(), records);

        Ok(results.get(&definition.name))
    }

    /// Run every definition in the given order
    pub async fn run_all(
        &self,
        definitions: &[EntityDefinition],
        sets: &mut CatalogSets,
        results: &mut EntityResults,
    ) -> Result<()> {
        let total = definitions.len();
        for (index, definition) in definitions.iter().enumerate() {
            let count = self.process_entity(definition, sets, results).await?.len();
            info!("[{}/{}] {}: {} records", index + 1, total, definition.name, count);
        }
        Ok(())
    }
}

/// Feed output and projected sets from retrieved records
fn project(definition: &EntityDefinition, records: &[serde_json::Value], sets: &mut CatalogSets) {
    if let Some(output_set) = &definition.output_set {
        sets.add_all(output_set, records.iter().filter_map(record_id));
    }

    for projection in definition.projections() {
        let values: Vec<String> = records
            .iter()
            .filter_map(|record| resolve_path(record, &projection.path).as_key())
            .collect();
        sets.add_all(&projection.set, values);
    }
}
