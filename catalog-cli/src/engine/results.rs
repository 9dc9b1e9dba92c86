//! Per-entity result collections

use std::borrow::Borrow;
use std::collections::HashSet;

use crate::catalog::record_id;

/// Retrieved records keyed by entity name, in execution order
#[derive(Debug, Clone, Default)]
pub struct EntityResults {
    entries: Vec<(String, Vec<serde_json::Value>)>,
}

impl EntityResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the records for an entity, replacing any earlier collection
    /// under the same name while keeping its position.
    pub fn insert(&mut self, entity: impl Into<String>, records: Vec<serde_json::Value>) {
        let entity = entity.into();
        match self.entries.iter_mut().find(|(name, _)| *name == entity) {
            Some((_, existing)) => *existing = records,
            None => self.entries.push((entity, records)),
        }
    }

    /// Records of an entity; empty when the entity never ran
    pub fn get(&self, entity: &str) -> &[serde_json::Value] {
        self.entries
            .iter()
            .find(|(name, _)| name == entity)
            .map(|(_, records)| records.as_slice())
            .unwrap_or(&[])
    }

    #[cfg(test)]
    pub fn contains(&self, entity: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[serde_json::Value])> {
        self.entries
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Row count per entity, in execution order
    pub fn counts(&self) -> Vec<(String, usize)> {
        self.entries
            .iter()
            .map(|(name, records)| (name.clone(), records.len()))
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.entries.iter().map(|(_, records)| records.len()).sum()
    }
}

/// Drop records whose `Id` was already seen, keeping the first occurrence.
/// Records without an `Id` are always kept.
pub fn dedupe_by_id<R>(records: impl IntoIterator<Item = R>) -> Vec<R>
where
    R: Borrow<serde_json::Value>,
{
    let mut seen: HashSet<String> = HashSet::new();
    records
        .into_iter()
        .filter(|record| match record_id(record.borrow()) {
            Some(id) => seen.insert(id.to_string()),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(records: &[serde_json::Value]) -> Vec<Option<&str>> {
        records.iter().map(|r| r["Id"].as_str()).collect()
    }

    #[test]
    fn test_dedupe_first_occurrence_wins() {
        let records = vec![
            json!({"Id": "a", "Name": "first"}),
            json!({"Id": "b"}),
            json!({"Id": "a", "Name": "second"}),
        ];

        let deduped = dedupe_by_id(records);
        assert_eq!(ids(&deduped), vec![Some("a"), Some("b")]);
        assert_eq!(deduped[0]["Name"], "first");
    }

    #[test]
    fn test_dedupe_keeps_rows_without_id() {
        let records = vec![
            json!({"total": 1}),
            json!({"total": 1}),
            json!({"Id": ""}),
            json!({"Id": "a"}),
        ];

        let deduped = dedupe_by_id(records);
        assert_eq!(deduped.len(), 4);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let records = vec![
            json!({"Id": "c"}),
            json!({"Id": "a"}),
            json!({"Id": "c"}),
            json!({"x": 1}),
            json!({"Id": "b"}),
            json!({"Id": "a"}),
        ];

        let once = dedupe_by_id(records);
        let twice = dedupe_by_id(once.clone());
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec![Some("c"), Some("a"), None, Some("b")]);
    }

    #[test]
    fn test_dedupe_by_reference() {
        let records = vec![json!({"Id": "a"}), json!({"Id": "a"})];
        let deduped: Vec<&serde_json::Value> = dedupe_by_id(records.iter());
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn test_results_keep_execution_order() {
        let mut results = EntityResults::new();
        results.insert("B", vec![json!({"Id": "b1"})]);
        results.insert("A", vec![]);
        results.insert("B", vec![json!({"Id": "b1"}), json!({"Id": "b2"})]);

        assert_eq!(
            results.counts(),
            vec![("B".to_string(), 2), ("A".to_string(), 0)]
        );
        assert!(results.contains("A"));
        assert!(results.get("Missing").is_empty());
        assert_eq!(results.total_records(), 2);
    }
}
