//! Query templates with `${set_name}` placeholders
//!
//! A where-template references catalog sets by name. Expansion substitutes
//! each placeholder with a quoted IN-list, splitting large sets into chunks
//! so that no IN-list exceeds the API's query size limit.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::CatalogSets;

/// Maximum number of values in a single IN-list
pub const CHUNK_SIZE: usize = 200;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"));

/// Distinct placeholder names in first-occurrence order
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Quote a single value as a SOQL string literal
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Render values as a comma-joined list of quoted literals
pub fn in_list<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| quote(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Append a where clause to a base query
pub fn build_query(base: &str, clause: &str) -> String {
    let base = base.trim_end();
    if clause.trim().is_empty() {
        return base.to_string();
    }
    format!("{} WHERE {}", base, clause)
}

/// Expand a where-template into one clause per chunk combination
///
/// Every referenced set is read once and split into chunks of `chunk_size`.
/// One clause is produced per combination of chunks, so each IN-list holds at
/// most `chunk_size` values and every value appears in some clause. A template
/// referencing an empty (or unknown) set expands to nothing.
pub fn expand_template(template: &str, sets: &CatalogSets, chunk_size: usize) -> Vec<String> {
    let names = placeholders(template);
    if names.is_empty() {
        return vec![template.to_string()];
    }

    let chunk_size = chunk_size.max(1);
    let mut lists: Vec<(String, Vec<String>)> = Vec::with_capacity(names.len());
    for name in names {
        let snapshot = sets.snapshot(&name);
        // Applies to OR templates too: the clause is dropped as a whole, so
        // rows the other sets would have matched are not fetched either
        if snapshot.is_empty() {
            log::debug!("Catalog set '{}' is empty, template yields no queries", name);
            return Vec::new();
        }
        let rendered = snapshot.chunks(chunk_size).map(in_list).collect();
        lists.push((name, rendered));
    }

    let total: usize = lists.iter().map(|(_, chunks)| chunks.len()).product();
    let mut clauses = Vec::with_capacity(total);
    let mut cursor = vec![0usize; lists.len()];

    loop {
        let clause = PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                lists
                    .iter()
                    .position(|(name, _)| name == &caps[1])
                    .map(|i| lists[i].1[cursor[i]].clone())
                    .unwrap_or_default()
            })
            .into_owned();
        clauses.push(clause);

        // Advance the chunk cursor, last placeholder fastest
        let mut pos = lists.len();
        loop {
            if pos == 0 {
                return clauses;
            }
            pos -= 1;
            cursor[pos] += 1;
            if cursor[pos] < lists[pos].1.len() {
                break;
            }
            cursor[pos] = 0;
        }
    }
}
