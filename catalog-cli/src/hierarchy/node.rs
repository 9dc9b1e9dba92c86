//! Assembled tree types
//!
//! Every element pairs a record with its resolved children. Empty
//! collections and unresolved lookups are omitted when serialized.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::record_id;

type Record = serde_json::Value;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Product with its nested bundles
#[derive(Debug, Clone, Serialize)]
pub struct ProductNode {
    pub entity: &'static str,
    pub record: Record,
    /// Set when the product was already expanded elsewhere in the tree
    #[serde(skip_serializing_if = "is_false")]
    pub stub: bool,
    pub children: ProductChildren,
}

impl ProductNode {
    pub fn id(&self) -> Option<&str> {
        record_id(&self.record)
    }

    /// Products nested below this one (spec or direct children)
    pub fn nested_products(&self) -> Vec<&ProductNode> {
        self.children
            .product_spec
            .as_deref()
            .into_iter()
            .chain(self.children.products.iter())
            .collect()
    }

    /// Number of nodes in this subtree, stubs included
    pub fn size(&self) -> usize {
        1 + self
            .nested_products()
            .iter()
            .map(|child| child.size())
            .sum::<usize>()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductChildren {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_spec: Option<Box<ProductNode>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<ProductNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_class: Option<ObjectClassBundle>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeBundle>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<RecordNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<ActionOwnerBundle>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub procedures: Vec<ActionOwnerBundle>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pricing: Vec<PriceEntryBundle>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub layouts: Vec<LayoutBundle>,
}

impl ProductChildren {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.product_spec.is_none()
            && self.products.is_empty()
            && self.object_class.is_none()
            && self.attributes.is_empty()
            && self.overrides.is_empty()
            && self.relationships.is_empty()
            && self.procedures.is_empty()
            && self.pricing.is_empty()
            && self.layouts.is_empty()
    }
}

/// Record without nested children
#[derive(Debug, Clone, Serialize)]
pub struct RecordNode {
    pub entity: &'static str,
    pub record: Record,
}

/// Attribute assignment with its attribute and category
#[derive(Debug, Clone, Serialize)]
pub struct AttributeBundle {
    pub entity: &'static str,
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Record>,
}

/// Relationship or configuration procedure carrying rule actions
#[derive(Debug, Clone, Serialize)]
pub struct ActionOwnerBundle {
    pub entity: &'static str,
    pub record: Record,
    pub rule_actions: Vec<RuleActionBundle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleActionBundle {
    pub entity: &'static str,
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rule_variables: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rule_filters: Vec<RuleFilterBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_entity_filter: Option<EntityFilterBundle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleFilterBundle {
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_filter: Option<EntityFilterBundle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityFilterBundle {
    pub record: Record,
    pub conditions: Vec<Record>,
    pub members: Vec<Record>,
    pub arguments_by_condition: BTreeMap<String, Vec<Record>>,
}

/// Price list entry with its pricing element, variable and bindings
#[derive(Debug, Clone, Serialize)]
pub struct PriceEntryBundle {
    pub entity: &'static str,
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_element: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_variable: Option<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Record>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutBundle {
    pub entity: &'static str,
    pub record: Record,
    pub facets: Vec<FacetBundle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FacetBundle {
    pub entity: &'static str,
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_facet: Option<Record>,
    pub sections: Vec<SectionBundle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionBundle {
    pub entity: &'static str,
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_section: Option<Record>,
    pub elements: Vec<Record>,
}

/// Object class of a product and the attributes it defines
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObjectClassBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
    #[serde(skip_serializing_if = "AttributeGroup::is_empty")]
    pub field_attributes: AttributeGroup,
    #[serde(skip_serializing_if = "AttributeGroup::is_empty")]
    pub attribute_bindings: AttributeGroup,
}

/// Records referencing attributes, with the distinct attributes,
/// categories and picklists they point at
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttributeGroup {
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub picklists: Vec<Record>,
}

