//! Entity definitions: what to query, in which order, and which catalog sets
//! each step feeds
//!
//! Definitions are kept as data (query text plus `${set}` placeholders) and
//! validated before any remote call: every placeholder must name a set that
//! an earlier definition, or the run's seed, populates.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::placeholders;

/// Bundled definitions for the product catalog, in execution order
const BUNDLED_DEFINITIONS: &str = include_str!("../../queries/epc.toml");

/// One alternative of an "any-of" where clause
///
/// Only emitted when `if_set` has members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyOfClause {
    /// Catalog set that gates (and drives) this alternative
    pub if_set: String,
    /// Where-template for this alternative
    #[serde(rename = "where")]
    pub where_clause: String,
}

/// Declarative description of one retrievable record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Unique logical name (e.g., "ProductChildItem")
    pub name: String,
    /// Remote object API name (e.g., "vlocity_cmt__ProductChildItem__c")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
    /// Query without its where clause
    pub base: String,
    /// Single where-template
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    /// Alternative where-templates, each producing its own queries
    #[serde(default, alias = "any_of_sets", skip_serializing_if = "Vec::is_empty")]
    pub where_any_of: Vec<AnyOfClause>,
    /// "set:field.path" projections applied to every retrieved row
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields_to_collect: Vec<String>,
    /// Set receiving the identifier of every retrieved row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_set: Option<String>,
}

/// A parsed "set:field.path" projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub set: String,
    pub path: String,
}

impl Projection {
    /// Parse "set:field.path"
    pub fn parse(entry: &str) -> Option<Self> {
        let (set, path) = entry.split_once(':')?;
        let (set, path) = (set.trim(), path.trim());
        if set.is_empty() || path.is_empty() {
            return None;
        }
        Some(Projection {
            set: set.to_string(),
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
impl EntityDefinition {
    /// Create a definition that runs its base query unmodified
    pub fn new(name: impl Into<String>, base: impl Into<String>) -> Self {
        EntityDefinition {
            name: name.into(),
            api_name: None,
            base: base.into(),
            where_clause: None,
            where_any_of: Vec::new(),
            fields_to_collect: Vec::new(),
            output_set: None,
        }
    }

    pub fn with_api_name(mut self, api_name: impl Into<String>) -> Self {
        self.api_name = Some(api_name.into());
        self
    }

    pub fn with_where(mut self, template: impl Into<String>) -> Self {
        self.where_clause = Some(template.into());
        self
    }

    pub fn with_any_of(mut self, if_set: impl Into<String>, template: impl Into<String>) -> Self {
        self.where_any_of.push(AnyOfClause {
            if_set: if_set.into(),
            where_clause: template.into(),
        });
        self
    }

    pub fn with_projection(mut self, entry: impl Into<String>) -> Self {
        self.fields_to_collect.push(entry.into());
        self
    }

    pub fn with_output_set(mut self, set: impl Into<String>) -> Self {
        self.output_set = Some(set.into());
        self
    }
}

impl EntityDefinition {
    /// Parsed projections (malformed entries are rejected at load time)
    pub fn projections(&self) -> Vec<Projection> {
        self.fields_to_collect
            .iter()
            .filter_map(|entry| Projection::parse(entry))
            .collect()
    }

    /// Catalog sets this definition writes to
    pub fn produced_sets(&self) -> Vec<String> {
        let mut sets: Vec<String> = self.output_set.iter().cloned().collect();
        for projection in self.projections() {
            if !sets.contains(&projection.set) {
                sets.push(projection.set);
            }
        }
        sets
    }

    /// Catalog sets this definition's templates read from
    pub fn referenced_sets(&self) -> Vec<String> {
        let mut sets: Vec<String> = Vec::new();
        let templates = self
            .where_clause
            .iter()
            .chain(self.where_any_of.iter().map(|alt| &alt.where_clause));
        for template in templates {
            for name in placeholders(template) {
                if !sets.contains(&name) {
                    sets.push(name);
                }
            }
        }
        for alt in &self.where_any_of {
            if !sets.contains(&alt.if_set) {
                sets.push(alt.if_set.clone());
            }
        }
        sets
    }
}

/// Error in the entity definitions
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The definitions file is not valid TOML or has the wrong shape
    Parse { message: String },
    /// A definition has an empty name
    MissingName { index: usize },
    /// Two definitions share a name
    DuplicateEntity { name: String },
    /// A definition has no base query
    MissingBase { entity: String },
    /// A projection is not of the form "set:field.path"
    InvalidProjection { entity: String, entry: String },
    /// A template references a set nothing populates before this definition runs
    UnknownCatalogSet { entity: String, set: String },
    /// An any-of alternative is gated on a set its template does not use
    UnusedGateSet { entity: String, set: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse { message } => {
                write!(f, "Invalid entity definitions: {}", message)
            }
            ConfigError::MissingName { index } => {
                write!(f, "Entity definition #{} has no name", index + 1)
            }
            ConfigError::DuplicateEntity { name } => {
                write!(f, "Entity '{}' is defined more than once", name)
            }
            ConfigError::MissingBase { entity } => {
                write!(f, "Entity '{}' has an empty base query", entity)
            }
            ConfigError::InvalidProjection { entity, entry } => {
                write!(
                    f,
                    "Entity '{}' has invalid projection '{}' - expected 'set:field.path'",
                    entity, entry
                )
            }
            ConfigError::UnknownCatalogSet { entity, set } => {
                write!(
                    f,
                    "Entity '{}' references catalog set '{}' which no earlier entity populates - check the execution order",
                    entity, set
                )
            }
            ConfigError::UnusedGateSet { entity, set } => {
                write!(
                    f,
                    "Entity '{}' has an any-of clause gated on '{}' but its template never references it",
                    entity, set
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Check definitions against the ordering contract
///
/// `seed_sets` are populated before the first definition runs.
pub fn validate(definitions: &[EntityDefinition], seed_sets: &[&str]) -> Result<(), ConfigError> {
    let mut known: HashSet<String> = seed_sets.iter().map(|s| s.to_string()).collect();
    let mut names: HashSet<&str> = HashSet::new();

    for (index, def) in definitions.iter().enumerate() {
        if def.name.trim().is_empty() {
            return Err(ConfigError::MissingName { index });
        }
        if !names.insert(def.name.as_str()) {
            return Err(ConfigError::DuplicateEntity {
                name: def.name.clone(),
            });
        }
        if def.base.trim().is_empty() {
            return Err(ConfigError::MissingBase {
                entity: def.name.clone(),
            });
        }
        if let Some(entry) = def
            .fields_to_collect
            .iter()
            .find(|entry| Projection::parse(entry).is_none())
        {
            return Err(ConfigError::InvalidProjection {
                entity: def.name.clone(),
                entry: entry.clone(),
            });
        }

        for alt in &def.where_any_of {
            if !placeholders(&alt.where_clause).contains(&alt.if_set) {
                return Err(ConfigError::UnusedGateSet {
                    entity: def.name.clone(),
                    set: alt.if_set.clone(),
                });
            }
        }

        if let Some(set) = def.referenced_sets().into_iter().find(|s| !known.contains(s)) {
            return Err(ConfigError::UnknownCatalogSet {
                entity: def.name.clone(),
                set,
            });
        }

        known.extend(def.produced_sets());
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct DefinitionsFile {
    #[serde(default)]
    entities: Vec<EntityDefinition>,
}

/// Validated, ordered list of entity definitions
#[derive(Debug, Clone)]
pub struct EntityCatalog {
    definitions: Vec<EntityDefinition>,
}

impl EntityCatalog {
    /// Validate and wrap definitions
    pub fn new(definitions: Vec<EntityDefinition>, seed_sets: &[&str]) -> Result<Self, ConfigError> {
        validate(&definitions, seed_sets)?;
        Ok(EntityCatalog { definitions })
    }

    /// Parse `[[entities]]` tables from TOML
    pub fn from_toml_str(content: &str, seed_sets: &[&str]) -> Result<Self, ConfigError> {
        let file: DefinitionsFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        Self::new(file.entities, seed_sets)
    }

    /// Definitions shipped with the binary
    pub fn bundled(seed_sets: &[&str]) -> Result<Self, ConfigError> {
        Self::from_toml_str(BUNDLED_DEFINITIONS, seed_sets)
    }

    /// Load definitions from a file
    pub fn load(path: &Path, seed_sets: &[&str]) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read entity definitions: {}", path.display()))?;
        Self::from_toml_str(&content, seed_sets)
            .with_context(|| format!("Invalid entity definitions in {}", path.display()))
    }

    /// Definitions in execution order
    pub fn definitions(&self) -> &[EntityDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEEDS: &[&str] = &["product_ids"];

    fn names(catalog: &EntityCatalog) -> Vec<&str> {
        catalog.definitions().iter().map(|d| d.name.as_str()).collect()
    }

    fn product() -> EntityDefinition {
        EntityDefinition::new("Product2", "SELECT Id, Name FROM Product2")
            .with_api_name("Product2")
            .with_where("Id IN (${product_ids})")
            .with_output_set("product2_ids")
            .with_projection("object_class_ids:vlocity_cmt__ObjectTypeId__c")
    }

    fn child_item() -> EntityDefinition {
        EntityDefinition::new("ProductChildItem", "SELECT Id FROM vlocity_cmt__ProductChildItem__c")
            .with_where("vlocity_cmt__ParentProductId__c IN (${product2_ids})")
    }

    #[test]
    fn test_valid_order_passes() {
        let catalog = EntityCatalog::new(vec![product(), child_item()], SEEDS).unwrap();
        assert_eq!(names(&catalog), vec!["Product2", "ProductChildItem"]);
    }

    #[test]
    fn test_reversed_order_is_rejected() {
        let result = EntityCatalog::new(vec![child_item(), product()], SEEDS);
        assert_eq!(
            result.unwrap_err(),
            ConfigError::UnknownCatalogSet {
                entity: "ProductChildItem".into(),
                set: "product2_ids".into(),
            }
        );
    }

    #[test]
    fn test_projection_sets_count_as_produced() {
        let layouts = EntityDefinition::new("ObjectLayout", "SELECT Id FROM vlocity_cmt__ObjectLayout__c")
            .with_where("vlocity_cmt__ObjectClassId__c IN (${object_class_ids})");
        assert!(validate(&[product(), layouts], SEEDS).is_ok());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = validate(&[product(), product()], SEEDS);
        assert!(matches!(result, Err(ConfigError::DuplicateEntity { .. })));
    }

    #[test]
    fn test_invalid_projection_rejected() {
        let def = product().with_projection("no_separator");
        let result = validate(&[def], SEEDS);
        assert!(matches!(result, Err(ConfigError::InvalidProjection { .. })));
    }

    #[test]
    fn test_any_of_gate_must_be_known_and_used() {
        let unknown = EntityDefinition::new("RuleAction", "SELECT Id FROM vlocity_cmt__RuleAction__c")
            .with_any_of("relationship_ids", "vlocity_cmt__ProductRelationshipId__c IN (${relationship_ids})");
        assert!(matches!(
            validate(&[unknown], SEEDS),
            Err(ConfigError::UnknownCatalogSet { .. })
        ));

        let unused = EntityDefinition::new("RuleAction", "SELECT Id FROM vlocity_cmt__RuleAction__c")
            .with_any_of("product_ids", "Name != null");
        assert!(matches!(
            validate(&[unused], SEEDS),
            Err(ConfigError::UnusedGateSet { .. })
        ));
    }

    #[test]
    fn test_empty_base_rejected() {
        let def = EntityDefinition::new("Broken", "  ");
        assert!(matches!(validate(&[def], SEEDS), Err(ConfigError::MissingBase { .. })));
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
            [[entities]]
            name = "Product2"
            api_name = "Product2"
            base = "SELECT Id FROM Product2"
            where = "Id IN (${product_ids})"
            output_set = "product2_ids"

            [[entities]]
            name = "RuleAction"
            base = "SELECT Id FROM vlocity_cmt__RuleAction__c"
            fields_to_collect = ["rule_ids:vlocity_cmt__RuleId__c"]

            [[entities.where_any_of]]
            if_set = "product2_ids"
            where = "vlocity_cmt__ProductId__c IN (${product2_ids})"
        "#;

        let catalog = EntityCatalog::from_toml_str(content, SEEDS).unwrap();
        let rule_action = catalog
            .definitions()
            .iter()
            .find(|d| d.name == "RuleAction")
            .unwrap();
        assert_eq!(rule_action.where_any_of.len(), 1);
        assert_eq!(rule_action.produced_sets(), vec!["rule_ids"]);
        assert_eq!(rule_action.referenced_sets(), vec!["product2_ids"]);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = EntityCatalog::from_toml_str("[[entities]]\nname = 3", SEEDS);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_bundled_definitions_are_valid() {
        let catalog = EntityCatalog::bundled(SEEDS).unwrap();
        let order = names(&catalog);
        assert_eq!(order.first(), Some(&"Product2"));
        assert!(order.contains(&"PricingVariableBinding"));
        assert!(order.contains(&"CpqConfigurationSetup"));
    }
}
