//! Catalog set registry
//!
//! Named, grow-only sets of scalar values collected while entities are
//! retrieved. Later query templates read them to build their IN-lists.

use std::collections::{BTreeSet, HashMap};

static EMPTY: BTreeSet<String> = BTreeSet::new();

/// Registry of catalog sets for one run
#[derive(Debug, Clone, Default)]
pub struct CatalogSets {
    sets: HashMap<String, BTreeSet<String>>,
}

impl CatalogSets {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single value to a set, creating the set if needed
    #[cfg(test)]
    pub fn add(&mut self, set: &str, value: impl Into<String>) {
        self.sets.entry(set.to_string()).or_default().insert(value.into());
    }

    /// Add every value to a set, creating the set even when `values` is empty
    pub fn add_all<I, S>(&mut self, set: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target = self.sets.entry(set.to_string()).or_default();
        target.extend(values.into_iter().map(Into::into));
    }

    /// Members of a set; a set that was never written reads as empty
    pub fn get(&self, set: &str) -> &BTreeSet<String> {
        self.sets.get(set).unwrap_or(&EMPTY)
    }

    /// Stable copy of a set's members, sorted
    pub fn snapshot(&self, set: &str) -> Vec<String> {
        self.get(set).iter().cloned().collect()
    }

    /// Number of values in a set
    pub fn len(&self, set: &str) -> usize {
        self.get(set).len()
    }

    /// Names of every set written so far, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_set_is_empty() {
        let sets = CatalogSets::new();
        assert!(sets.get("product_ids").is_empty());
        assert_eq!(sets.len("product_ids"), 0);
        assert!(sets.snapshot("product_ids").is_empty());
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut sets = CatalogSets::new();
        sets.add("rule_ids", "r1");
        sets.add("rule_ids", "r1");
        sets.add_all("rule_ids", ["r2", "r1"]);

        assert_eq!(sets.snapshot("rule_ids"), vec!["r1", "r2"]);
    }

    #[test]
    fn test_add_all_creates_empty_set() {
        let mut sets = CatalogSets::new();
        sets.add_all("attribute_ids", Vec::<String>::new());

        assert_eq!(sets.names(), vec!["attribute_ids"]);
        assert!(sets.get("attribute_ids").is_empty());
    }
}
