//! Change history for recently modified records
//!
//! Discovery keeps the entities whose field history object exists in the
//! org. Collection selects rows modified on or after the cutoff and fetches
//! their history, grouped by the changed record.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, info};
use serde::Serialize;

use super::naming::{derive_history_object_name, history_owner_field};
use crate::api::QueryPort;
use crate::catalog::{CHUNK_SIZE, build_query, in_list, record_id, resolve_path};
use crate::config::EntityDefinition;
use crate::engine::EntityResults;

const LAST_MODIFIED_FIELD: &str = "LastModifiedDate";

/// Entity whose changes can be read from a history object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedEntity {
    pub entity: String,
    pub history_object: String,
    pub owner_field: String,
}

/// One field-level change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeLogRow {
    pub id: Option<String>,
    pub owner_id: String,
    pub field: Option<String>,
    pub old_value: serde_json::Value,
    pub new_value: serde_json::Value,
    pub created_date: Option<String>,
    pub created_by_id: Option<String>,
}

impl ChangeLogRow {
    fn from_record(record: &serde_json::Value, owner_field: &str) -> Option<Self> {
        let text = |path: &str| resolve_path(record, path).as_key();
        let raw = |field: &str| record.get(field).cloned().unwrap_or(serde_json::Value::Null);

        Some(ChangeLogRow {
            id: record_id(record).map(str::to_string),
            owner_id: text(owner_field)?,
            field: text("Field"),
            old_value: raw("OldValue"),
            new_value: raw("NewValue"),
            created_date: text("CreatedDate"),
            created_by_id: text("CreatedById"),
        })
    }
}

/// Per-entity activity summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityActivity {
    pub entity: String,
    pub recently_modified: usize,
    pub changes: usize,
}

/// Changes grouped by owning record
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryReport {
    pub cutoff: Option<DateTime<Utc>>,
    pub tracked: Vec<TrackedEntity>,
    pub activity: Vec<EntityActivity>,
    pub by_owner: BTreeMap<String, Vec<ChangeLogRow>>,
}

impl HistoryReport {
    pub fn total_changes(&self) -> usize {
        self.by_owner.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_owner.is_empty()
    }
}

/// Parse a platform timestamp into UTC
///
/// Offset-carrying values are converted directly. Naive values are read in
/// `timezone`; a date alone means midnight there.
pub fn parse_timestamp(raw: &str, timezone: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        // Fall back transition: use earlier occurrence
        LocalResult::Ambiguous(earlier, _later) => Some(earlier.with_timezone(&Utc)),
        LocalResult::None => {
            debug!("Skipping timestamp in DST gap: {}", raw);
            None
        }
    }
}

/// Cutoff rendered as a SOQL datetime literal
pub fn format_cutoff(cutoff: DateTime<Utc>) -> String {
    cutoff.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub struct HistoryCollector<'a> {
    port: &'a dyn QueryPort,
    timezone: Tz,
    chunk_size: usize,
}

impl<'a> HistoryCollector<'a> {
    pub fn new(port: &'a dyn QueryPort) -> Self {
        Self {
            port,
            timezone: Tz::UTC,
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Zone assumed for timestamps without an offset
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Entities whose history object exists in the org
    pub async fn discover(&self, definitions: &[EntityDefinition]) -> Result<Vec<TrackedEntity>> {
        let candidates: Vec<TrackedEntity> = definitions
            .iter()
            .filter_map(|def| {
                let api_name = def.api_name.as_deref()?;
                Some(TrackedEntity {
                    entity: def.name.clone(),
                    history_object: derive_history_object_name(api_name),
                    owner_field: history_owner_field(api_name),
                })
            })
            .collect();

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let known = self
            .port
            .list_object_names()
            .await
            .context("Failed to list objects for history discovery")?;

        let tracked: Vec<TrackedEntity> = candidates
            .into_iter()
            .filter(|candidate| {
                let exists = known.contains(&candidate.history_object);
                if !exists {
                    debug!("{}: {} not available", candidate.entity, candidate.history_object);
                }
                exists
            })
            .collect();

        info!("History tracking available for {} entities", tracked.len());
        Ok(tracked)
    }

    /// Ids of records modified at or after `cutoff`
    pub fn recently_modified(
        &self,
        records: &[serde_json::Value],
        cutoff: DateTime<Utc>,
    ) -> BTreeSet<String> {
        records
            .iter()
            .filter(|record| {
                resolve_path(record, LAST_MODIFIED_FIELD)
                    .as_str()
                    .and_then(|raw| parse_timestamp(raw, self.timezone))
                    .is_some_and(|modified| modified >= cutoff)
            })
            .filter_map(record_id)
            .map(str::to_string)
            .collect()
    }

    /// History query for one chunk of owner ids
    pub fn history_query(&self, tracked: &TrackedEntity, ids: &[String], cutoff: DateTime<Utc>) -> String {
        build_query(
            &format!(
                "SELECT Id, {}, Field, OldValue, NewValue, CreatedDate, CreatedById FROM {}",
                tracked.owner_field, tracked.history_object
            ),
            &format!(
                "{} IN ({}) AND CreatedDate >= {}",
                tracked.owner_field,
                in_list(ids),
                format_cutoff(cutoff)
            ),
        )
    }

    /// Discover tracked entities and fetch changes since `cutoff`
    pub async fn collect(
        &self,
        definitions: &[EntityDefinition],
        results: &EntityResults,
        cutoff: DateTime<Utc>,
    ) -> Result<HistoryReport> {
        let tracked = self.discover(definitions).await?;
        let mut report = HistoryReport {
            cutoff: Some(cutoff),
            ..Default::default()
        };

        for (entity, records) in results.iter() {
            if records.is_empty() {
                continue;
            }

            let ids: Vec<String> = self.recently_modified(records, cutoff).into_iter().collect();
            if ids.is_empty() {
                continue;
            }

            let mut changes = 0usize;
            if let Some(target) = tracked.iter().find(|t| t.entity == entity) {
                for chunk in ids.chunks(self.chunk_size) {
                    let soql = self.history_query(target, chunk, cutoff);
                    let rows = self.port.query(&soql).await.with_context(|| {
                        format!("Failed to fetch history for {} with query: {}", entity, soql)
                    })?;

                    for row in &rows {
                        match ChangeLogRow::from_record(row, &target.owner_field) {
                            Some(change) => {
                                changes += 1;
                                report
                                    .by_owner
                                    .entry(change.owner_id.clone())
                                    .or_default()
                                    .push(change);
                            }
                            None => debug!("{}: history row without owner skipped", entity),
                        }
                    }
                }
            }

            debug!("{}: {} modified, {} changes", entity, ids.len(), changes);
            report.activity.push(EntityActivity {
                entity: entity.to_string(),
                recently_modified: ids.len(),
                changes,
            });
        }

        report.tracked = tracked;
        info!(
            "Collected {} changes across {} records",
            report.total_changes(),
            report.by_owner.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePort;
    use serde_json::json;

    fn cutoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn foo_definition() -> EntityDefinition {
        EntityDefinition::new("X", "SELECT Id FROM Foo__c").with_api_name("Foo__c")
    }

    fn foo_results() -> EntityResults {
        let mut results = EntityResults::new();
        results.insert(
            "X",
            vec![
                json!({"Id": "f1", "LastModifiedDate": "2024-05-01T10:00:00.000+0000"}),
                json!({"Id": "f2", "LastModifiedDate": "2024-04-30T09:59:59.000+0000"}),
                json!({"Id": "f3", "LastModifiedDate": null}),
            ],
        );
        results
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let tz: Tz = "Europe/Brussels".parse().unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2024-05-01T10:00:00.000+0000", tz), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T10:00:00Z", tz), Some(expected));
        // naive values are local to the configured zone (CEST, +02:00)
        assert_eq!(parse_timestamp("2024-05-01T12:00:00", tz), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01 12:00:00", tz), Some(expected));
        assert_eq!(
            parse_timestamp("2024-05-01", tz),
            Some(Utc.with_ymd_and_hms(2024, 4, 30, 22, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday", tz), None);
        assert_eq!(parse_timestamp("", tz), None);
        // spring forward gap
        assert_eq!(parse_timestamp("2024-03-31T02:30:00", tz), None);
    }

    #[test]
    fn test_cutoff_boundary_is_inclusive() {
        let port = FakePort::new();
        let collector = HistoryCollector::new(&port);

        let ids = collector.recently_modified(foo_results().get("X"), cutoff());
        assert_eq!(ids, BTreeSet::from(["f1".to_string()]));
    }

    #[tokio::test]
    async fn test_missing_history_object_issues_no_query() {
        let port = FakePort::new().with_objects(&["Foo__c", "Product2History"]);
        let collector = HistoryCollector::new(&port);

        let report = collector
            .collect(&[foo_definition()], &foo_results(), cutoff())
            .await
            .unwrap();

        assert!(report.tracked.is_empty());
        assert!(report.is_empty());
        assert!(port.queries().is_empty());
        assert_eq!(port.listing_calls(), 1);
        assert_eq!(report.activity[0].recently_modified, 1);
        assert_eq!(report.activity[0].changes, 0);
    }

    #[tokio::test]
    async fn test_collects_and_groups_by_owner() {
        let port = FakePort::new()
            .with_objects(&["Foo__History"])
            .with_rows(
                "Foo__History",
                vec![
                    json!({"Id": "h1", "ParentId": "f1", "Field": "Name", "OldValue": "a", "NewValue": "b", "CreatedDate": "2024-05-01T11:00:00.000+0000", "CreatedById": "005A"}),
                    json!({"Id": "h2", "ParentId": "f1", "Field": "vlocity_cmt__IsActive__c", "OldValue": false, "NewValue": true, "CreatedDate": "2024-05-02T08:00:00.000+0000", "CreatedById": "005B"}),
                    json!({"Id": "h3", "ParentId": "f2", "Field": "Name"}),
                ],
            );
        let collector = HistoryCollector::new(&port);

        let report = collector
            .collect(&[foo_definition()], &foo_results(), cutoff())
            .await
            .unwrap();

        assert_eq!(
            port.queries(),
            vec![
                "SELECT Id, ParentId, Field, OldValue, NewValue, CreatedDate, CreatedById FROM Foo__History WHERE ParentId IN ('f1') AND CreatedDate >= 2024-05-01T10:00:00Z"
                    .to_string()
            ]
        );
        assert_eq!(report.tracked[0].owner_field, "ParentId");
        assert_eq!(report.by_owner.len(), 1);
        let changes = &report.by_owner["f1"];
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].new_value, json!(true));
        assert_eq!(changes[0].created_by_id.as_deref(), Some("005A"));
    }

    #[tokio::test]
    async fn test_history_ids_are_chunked() {
        let mut results = EntityResults::new();
        results.insert(
            "Product2",
            (0..5)
                .map(|i| json!({"Id": format!("01t{}", i), "LastModifiedDate": "2024-06-01T00:00:00Z"}))
                .collect(),
        );
        let port = FakePort::new().with_objects(&["Product2History"]);
        let collector = HistoryCollector::new(&port).with_chunk_size(2);
        let definition =
            EntityDefinition::new("Product2", "SELECT Id FROM Product2").with_api_name("Product2");

        collector.collect(&[definition], &results, cutoff()).await.unwrap();

        let queries = port.queries_for("Product2History");
        assert_eq!(queries.len(), 3);
        assert!(queries[0].contains("Product2Id IN ('01t0','01t1')"));
    }

    #[tokio::test]
    async fn test_no_api_names_skips_listing() {
        let port = FakePort::new();
        let collector = HistoryCollector::new(&port);
        let definition = EntityDefinition::new("X", "SELECT Id FROM X");

        let report = collector
            .collect(&[definition], &foo_results(), cutoff())
            .await
            .unwrap();

        assert_eq!(port.listing_calls(), 0);
        assert!(report.is_empty());
    }
}
