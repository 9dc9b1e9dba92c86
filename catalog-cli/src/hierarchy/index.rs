//! Foreign-key and id indices over retrieved records

use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::json;

use super::schema::{self, Relation, fields};
use crate::api::QueryPort;
use crate::catalog::{build_query, in_list, record_id, resolve_path};
use crate::engine::EntityResults;

const PRODUCT_DETAILS_QUERY: &str = "SELECT Id, Name, CreatedDate, LastModifiedDate FROM Product2";

/// Group records by the value of `field`; records without it are left out
pub fn group_by<'a>(records: &'a [serde_json::Value], field: &str) -> HashMap<String, Vec<&'a serde_json::Value>> {
    let mut groups: HashMap<String, Vec<&'a serde_json::Value>> = HashMap::new();
    for record in records {
        if let Some(key) = resolve_path(record, field).as_key() {
            groups.entry(key).or_default().push(record);
        }
    }
    groups
}

/// Map records by `Id`, first occurrence wins
pub fn index_by_id(records: &[serde_json::Value]) -> HashMap<String, &serde_json::Value> {
    let mut index = HashMap::new();
    for record in records {
        if let Some(id) = record_id(record) {
            index.entry(id.to_string()).or_insert(record);
        }
    }
    index
}

/// Lookups needed to assemble product trees
pub struct HierarchyIndex<'a> {
    groups: HashMap<Relation, HashMap<String, Vec<&'a serde_json::Value>>>,
    lookups: HashMap<&'static str, HashMap<String, &'a serde_json::Value>>,
    products: HashMap<String, serde_json::Value>,
    product_names: HashMap<String, String>,
    child_products: HashMap<String, Vec<String>>,
}

impl<'a> HierarchyIndex<'a> {
    pub fn build(results: &'a EntityResults) -> Self {
        let groups = schema::TREE_RELATIONS
            .iter()
            .map(|relation| (*relation, group_by(results.get(relation.child), relation.field)))
            .collect();

        let lookups = schema::LOOKUP_ENTITIES
            .iter()
            .map(|entity| (*entity, index_by_id(results.get(entity))))
            .collect();

        let products: HashMap<String, serde_json::Value> = index_by_id(results.get(schema::PRODUCT))
            .into_iter()
            .map(|(id, record)| (id, record.clone()))
            .collect();

        let mut product_names: HashMap<String, String> = HashMap::new();
        let mut remember = |record: &serde_json::Value, id_field: &str, name_field: &str| {
            let id = resolve_path(record, id_field).as_key();
            let name = resolve_path(record, name_field).as_key();
            if let (Some(id), Some(name)) = (id, name) {
                product_names.entry(id).or_insert(name);
            }
        };
        for record in results.get(schema::PRODUCT) {
            remember(record, fields::PRODUCT_SPEC, fields::PRODUCT_SPEC_NAME);
        }
        for record in results.get(schema::PRODUCT_CHILD_ITEM) {
            remember(record, fields::PARENT_PRODUCT, fields::PARENT_PRODUCT_NAME);
            remember(record, fields::CHILD_PRODUCT, fields::CHILD_PRODUCT_NAME);
        }

        let mut child_sets: HashMap<String, BTreeSet<String>> = HashMap::new();
        for record in results.get(schema::PRODUCT_CHILD_ITEM) {
            let parent = resolve_path(record, fields::PARENT_PRODUCT).as_key();
            let child = resolve_path(record, fields::CHILD_PRODUCT).as_key();
            if let (Some(parent), Some(child)) = (parent, child) {
                child_sets.entry(parent).or_default().insert(child);
            }
        }
        let child_products = child_sets
            .into_iter()
            .map(|(parent, children)| (parent, children.into_iter().collect()))
            .collect();

        HierarchyIndex {
            groups,
            lookups,
            products,
            product_names,
            child_products,
        }
    }

    /// Children of `parent_id` through `relation`
    pub fn children(&self, relation: Relation, parent_id: &str) -> &[&'a serde_json::Value] {
        self.groups
            .get(&relation)
            .and_then(|groups| groups.get(parent_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Record of a lookup entity by id
    pub fn lookup(&self, entity: &str, id: Option<&str>) -> Option<&'a serde_json::Value> {
        let id = id?;
        self.lookups.get(entity)?.get(id).copied()
    }

    /// Follow a foreign key on `record` to a lookup entity
    pub fn follow(&self, entity: &str, record: &serde_json::Value, field: &str) -> Option<&'a serde_json::Value> {
        let id = resolve_path(record, field).as_key();
        self.lookup(entity, id.as_deref())
    }

    pub fn product_name(&self, id: &str) -> Option<&str> {
        self.product_names.get(id).map(String::as_str)
    }

    /// Full record if known, otherwise `{Id, Name}` from relationship
    /// lookups, otherwise `{Id}`
    pub fn best_known_product(&self, id: &str) -> serde_json::Value {
        match (self.products.get(id), self.product_name(id)) {
            (Some(record), _) => record.clone(),
            (None, Some(name)) => json!({"Id": id, "Name": name}),
            (None, None) => json!({"Id": id}),
        }
    }

    /// Direct child products, deduplicated and sorted
    pub fn child_products(&self, parent_id: &str) -> &[String] {
        self.child_products
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every product id seen in products, child items and spec references
    pub fn product_ids(&self) -> BTreeSet<String> {
        let mut ids: BTreeSet<String> = self.products.keys().cloned().collect();
        for (parent, children) in &self.child_products {
            ids.insert(parent.clone());
            ids.extend(children.iter().cloned());
        }
        for record in self.products.values() {
            if let Some(spec) = resolve_path(record, fields::PRODUCT_SPEC).as_key() {
                ids.insert(spec);
            }
        }
        ids
    }

    /// Product ids without a record carrying a `Name`
    pub fn missing_product_ids(&self) -> Vec<String> {
        self.product_ids()
            .into_iter()
            .filter(|id| {
                self.products
                    .get(id)
                    .map(|record| resolve_path(record, fields::NAME).as_key().is_none())
                    .unwrap_or(true)
            })
            .collect()
    }

    /// Merge fetched product rows; existing non-null fields are kept
    pub fn merge_products(&mut self, rows: Vec<serde_json::Value>) {
        for row in rows {
            let Some(id) = record_id(&row).map(str::to_string) else {
                continue;
            };
            match self.products.get_mut(&id) {
                Some(existing) => {
                    if let (Some(target), serde_json::Value::Object(source)) = (existing.as_object_mut(), row) {
                        for (key, value) in source {
                            let absent = target.get(&key).is_none_or(serde_json::Value::is_null);
                            if absent {
                                target.insert(key, value);
                            }
                        }
                    }
                }
                None => {
                    self.products.insert(id, row);
                }
            }
        }
    }

    /// Fetch details for products referenced but not (fully) retrieved,
    /// at most `chunk_size` ids per query
    pub async fn fill_missing_products(&mut self, port: &dyn QueryPort, chunk_size: usize) -> Result<usize> {
        let missing = self.missing_product_ids();
        if missing.is_empty() {
            debug!("All referenced products already retrieved");
            return Ok(0);
        }

        info!("Fetching details for {} referenced products", missing.len());
        let mut fetched = 0usize;
        for chunk in missing.chunks(chunk_size.max(1)) {
            let soql = build_query(PRODUCT_DETAILS_QUERY, &format!("Id IN ({})", in_list(chunk)));
            let rows = port
                .query(&soql)
                .await
                .with_context(|| format!("Failed to fetch product details with query: {}", soql))?;
            fetched += rows.len();
            self.merge_products(rows);
        }

        Ok(fetched)
    }
}
