//! Flat, grouped listings derived from the tree and the raw results

use serde::Serialize;

use super::index::group_by;
use super::node::{PriceEntryBundle, ProductNode};
use super::schema::{self, Relation};
use crate::catalog::record_id;
use crate::engine::{EntityResults, dedupe_by_id};

/// Price list entries of one product with their pricing records grouped
/// across entries, each listed once
#[derive(Debug, Clone, Default, Serialize)]
pub struct PricingListing {
    pub entries: Vec<serde_json::Value>,
    pub pricing_elements: Vec<serde_json::Value>,
    pub pricing_variables: Vec<serde_json::Value>,
    pub bindings: Vec<serde_json::Value>,
}

impl PricingListing {
    pub fn from_bundles(bundles: &[PriceEntryBundle]) -> Self {
        fn cloned(records: Vec<&serde_json::Value>) -> Vec<serde_json::Value> {
            records.into_iter().cloned().collect()
        }

        PricingListing {
            entries: cloned(dedupe_by_id(bundles.iter().map(|b| &b.record))),
            pricing_elements: cloned(dedupe_by_id(
                bundles.iter().filter_map(|b| b.pricing_element.as_ref()),
            )),
            pricing_variables: cloned(dedupe_by_id(
                bundles.iter().filter_map(|b| b.pricing_variable.as_ref()),
            )),
            bindings: cloned(dedupe_by_id(bundles.iter().flat_map(|b| b.bindings.iter()))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPricing {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(flatten)]
    pub listing: PricingListing,
}

/// Pricing of every expanded product in the trees, depth first
pub fn pricing_by_product(roots: &[ProductNode]) -> Vec<ProductPricing> {
    fn walk(node: &ProductNode, out: &mut Vec<ProductPricing>) {
        if node.stub {
            return;
        }
        if !node.children.pricing.is_empty() {
            out.push(ProductPricing {
                product_id: node.id().unwrap_or_default().to_string(),
                product_name: node.record["Name"].as_str().map(str::to_string),
                listing: PricingListing::from_bundles(&node.children.pricing),
            });
        }
        for child in node.nested_products() {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    for root in roots {
        walk(root, &mut out);
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct CalculationVersion {
    pub entity: &'static str,
    pub record: serde_json::Value,
    pub items: Vec<serde_json::Value>,
}

/// Calculation matrix or procedure with its versions and their rows/steps
#[derive(Debug, Clone, Serialize)]
pub struct CalculationTree {
    pub entity: &'static str,
    pub record: serde_json::Value,
    pub versions: Vec<CalculationVersion>,
}

fn calculation_trees(
    results: &EntityResults,
    entity: &'static str,
    versions: Relation,
    items: Relation,
) -> Vec<CalculationTree> {
    let versions_by_parent = group_by(results.get(versions.child), versions.field);
    let items_by_version = group_by(results.get(items.child), items.field);

    results
        .get(entity)
        .iter()
        .map(|record| {
            let record_versions = record_id(record)
                .and_then(|id| versions_by_parent.get(id))
                .map(|found| found.as_slice())
                .unwrap_or(&[]);

            CalculationTree {
                entity,
                record: record.clone(),
                versions: record_versions
                    .iter()
                    .map(|version| CalculationVersion {
                        entity: versions.child,
                        record: (*version).clone(),
                        items: record_id(version)
                            .and_then(|id| items_by_version.get(id))
                            .map(|found| found.iter().map(|item| (*item).clone()).collect::<Vec<_>>())
                            .unwrap_or_default(),
                    })
                    .collect(),
            }
        })
        .collect()
}

pub fn calculation_matrices(results: &EntityResults) -> Vec<CalculationTree> {
    calculation_trees(
        results,
        schema::CALCULATION_MATRIX,
        schema::MATRIX_VERSIONS_BY_MATRIX,
        schema::MATRIX_ROWS_BY_VERSION,
    )
}

pub fn calculation_procedures(results: &EntityResults) -> Vec<CalculationTree> {
    calculation_trees(
        results,
        schema::CALCULATION_PROCEDURE,
        schema::PROCEDURE_VERSIONS_BY_PROCEDURE,
        schema::PROCEDURE_STEPS_BY_VERSION,
    )
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CalculationListing {
    pub matrices: Vec<CalculationTree>,
    pub procedures: Vec<CalculationTree>,
}

impl CalculationListing {
    pub fn from_results(results: &EntityResults) -> Self {
        Self {
            matrices: calculation_matrices(results),
            procedures: calculation_procedures(results),
        }
    }
}
