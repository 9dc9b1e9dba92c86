//! In-memory query port for tests
//!
//! Rows are registered per object (the name after `FROM`). Every
//! `field IN (...)` predicate in an incoming query is applied as a filter;
//! other predicates are ignored. All queries are recorded.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::QueryPort;
use crate::catalog::resolve_path;

static FROM_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bFROM\s+([A-Za-z0-9_]+)").unwrap());
static IN_FILTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z0-9_.]+)\s+IN\s+\(([^)]*)\)").unwrap());

#[derive(Default)]
pub struct FakePort {
    rows: HashMap<String, Vec<serde_json::Value>>,
    objects: HashSet<String>,
    fail_on: Option<String>,
    log: Mutex<Vec<String>>,
    listings: Mutex<usize>,
}

impl FakePort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned for queries against `object`
    pub fn with_rows(mut self, object: &str, rows: Vec<serde_json::Value>) -> Self {
        self.rows.entry(object.to_string()).or_default().extend(rows);
        self
    }

    /// Object names reported by the listing call
    pub fn with_objects(mut self, names: &[&str]) -> Self {
        self.objects.extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Fail every query against `object`
    pub fn failing_on(mut self, object: &str) -> Self {
        self.fail_on = Some(object.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn queries_for(&self, object: &str) -> Vec<String> {
        self.queries()
            .into_iter()
            .filter(|q| from_object(q).as_deref() == Some(object))
            .collect()
    }

    pub fn listing_calls(&self) -> usize {
        *self.listings.lock().unwrap()
    }
}

fn from_object(soql: &str) -> Option<String> {
    FROM_OBJECT.captures(soql).map(|c| c[1].to_string())
}

fn in_filters(soql: &str) -> Vec<(String, HashSet<String>)> {
    IN_FILTER
        .captures_iter(soql)
        .map(|caps| {
            let values = caps[2]
                .split(',')
                .map(|v| v.trim().trim_matches('\'').to_string())
                .filter(|v| !v.is_empty())
                .collect();
            (caps[1].to_string(), values)
        })
        .collect()
}

#[async_trait]
impl QueryPort for FakePort {
    async fn query(&self, soql: &str) -> Result<Vec<serde_json::Value>> {
        self.log.lock().unwrap().push(soql.to_string());

        let object = from_object(soql).ok_or_else(|| anyhow!("no FROM clause: {}", soql))?;
        if self.fail_on.as_deref() == Some(object.as_str()) {
            return Err(anyhow!("HTTP 400: MALFORMED_QUERY"));
        }

        let filters = in_filters(soql);
        let rows = self.rows.get(&object).cloned().unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter(|row| {
                filters.iter().all(|(field, values)| {
                    resolve_path(row, field)
                        .as_key()
                        .is_some_and(|key| values.contains(&key))
                })
            })
            .collect())
    }

    async fn list_object_names(&self) -> Result<HashSet<String>> {
        *self.listings.lock().unwrap() += 1;
        Ok(self.objects.clone())
    }
}
