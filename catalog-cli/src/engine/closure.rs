//! Transitive closure of the product parent/child graph

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::api::QueryPort;
use crate::catalog::{CHUNK_SIZE, build_query, in_list, resolve_path};

/// Link object describing a parent → child edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureRelation {
    pub object: String,
    pub parent_field: String,
    pub child_field: String,
}

impl Default for ClosureRelation {
    fn default() -> Self {
        Self {
            object: "vlocity_cmt__ProductChildItem__c".to_string(),
            parent_field: "vlocity_cmt__ParentProductId__c".to_string(),
            child_field: "vlocity_cmt__ChildProductId__c".to_string(),
        }
    }
}

impl ClosureRelation {
    fn query(&self, parents: &[String]) -> String {
        build_query(
            &format!(
                "SELECT Id, {}, {} FROM {}",
                self.parent_field, self.child_field, self.object
            ),
            &format!("{} IN ({})", self.parent_field, in_list(parents)),
        )
    }
}

/// Breadth-first expansion of a root id over a link object
pub struct ClosureResolver<'a> {
    port: &'a dyn QueryPort,
    relation: ClosureRelation,
    chunk_size: usize,
}

impl<'a> ClosureResolver<'a> {
    pub fn new(port: &'a dyn QueryPort) -> Self {
        Self {
            port,
            relation: ClosureRelation::default(),
            chunk_size: CHUNK_SIZE,
        }
    }

    #[cfg(test)]
    pub fn with_relation(mut self, relation: ClosureRelation) -> Self {
        self.relation = relation;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Every id reachable from `root`, including `root` itself
    pub async fn resolve(&self, root: &str) -> Result<BTreeSet<String>> {
        let mut all_ids: BTreeSet<String> = BTreeSet::from([root.to_string()]);
        let mut frontier: BTreeSet<String> = all_ids.clone();
        let mut depth = 0usize;

        while !frontier.is_empty() {
            depth += 1;
            let parents: Vec<String> = frontier.into_iter().collect();
            let mut next: BTreeSet<String> = BTreeSet::new();

            for chunk in parents.chunks(self.chunk_size) {
                let soql = self.relation.query(chunk);
                let links = self
                    .port
                    .query(&soql)
                    .await
                    .with_context(|| format!("Failed to expand product closure with query: {}", soql))?;

                for link in &links {
                    if let Some(child) = resolve_path(link, &self.relation.child_field).as_key() {
                        if all_ids.insert(child.clone()) {
                            next.insert(child);
                        }
                    }
                }
            }

            debug!("Closure level {}: {} new ids", depth, next.len());
            frontier = next;
        }

        info!("Resolved {} ids reachable from {}", all_ids.len(), root);
        Ok(all_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePort;
    use serde_json::json;

    const OBJECT: &str = "vlocity_cmt__ProductChildItem__c";

    fn link(parent: &str, child: &str) -> serde_json::Value {
        json!({
            "Id": format!("{}-{}", parent, child),
            "vlocity_cmt__ParentProductId__c": parent,
            "vlocity_cmt__ChildProductId__c": child,
        })
    }

    #[tokio::test]
    async fn test_cycle_terminates_with_reachable_set() {
        let port = FakePort::new().with_rows(
            OBJECT,
            vec![link("A", "B"), link("B", "A"), link("B", "C"), link("X", "Y")],
        );

        let ids = ClosureResolver::new(&port).resolve("A").await.unwrap();

        assert_eq!(ids, BTreeSet::from(["A".into(), "B".into(), "C".into()]));
        // A, then B, then C (which finds nothing new)
        assert_eq!(port.queries().len(), 3);
    }

    #[tokio::test]
    async fn test_root_without_children() {
        let port = FakePort::new();
        let ids = ClosureResolver::new(&port).resolve("solo").await.unwrap();
        assert_eq!(ids, BTreeSet::from(["solo".to_string()]));
        assert_eq!(port.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_frontier_is_chunked() {
        let mut links: Vec<_> = (0..5).map(|i| link("root", &format!("c{}", i))).collect();
        links.push(link("c3", "leaf"));
        let port = FakePort::new().with_rows(OBJECT, links);

        let ids = ClosureResolver::new(&port)
            .with_chunk_size(2)
            .resolve("root")
            .await
            .unwrap();

        assert_eq!(ids.len(), 7);
        // root; c0..c4 in three chunks; leaf
        assert_eq!(port.queries().len(), 5);
        assert!(port.queries().iter().all(|q| q.matches(',').count() <= 3));
    }

    #[tokio::test]
    async fn test_custom_relation() {
        let port = FakePort::new().with_rows(
            "Bundle__c",
            vec![json!({"Id": "l1", "Parent__c": "p", "Child__c": "q"})],
        );
        let relation = ClosureRelation {
            object: "Bundle__c".into(),
            parent_field: "Parent__c".into(),
            child_field: "Child__c".into(),
        };

        let ids = ClosureResolver::new(&port)
            .with_relation(relation)
            .resolve("p")
            .await
            .unwrap();

        assert!(ids.contains("q"));
        assert_eq!(
            port.queries()[0],
            "SELECT Id, Parent__c, Child__c FROM Bundle__c WHERE Parent__c IN ('p')"
        );
    }
}
