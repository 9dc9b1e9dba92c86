//! Product tree assembly
//!
//! Recursion only follows product edges (spec or child items). A product
//! already expanded anywhere in the run is emitted again as a stub without
//! children, which bounds the tree on cyclic or shared graphs. Everything
//! below a product is a fixed-depth resolution through the index.

use std::collections::{BTreeMap, HashSet};

use log::debug;

use super::index::HierarchyIndex;
use super::node::{
    ActionOwnerBundle, AttributeBundle, AttributeGroup, EntityFilterBundle, FacetBundle,
    LayoutBundle, ObjectClassBundle, PriceEntryBundle, ProductChildren, ProductNode, RecordNode,
    RuleActionBundle, RuleFilterBundle, SectionBundle,
};
use super::schema::{self, Relation, fields};
use crate::catalog::{record_id, resolve_path};
use crate::engine::dedupe_by_id;

fn owned(records: &[&serde_json::Value]) -> Vec<serde_json::Value> {
    records.iter().map(|record| (*record).clone()).collect()
}

fn key(record: &serde_json::Value, field: &str) -> Option<String> {
    resolve_path(record, field).as_key()
}

pub struct HierarchyAssembler<'i, 'a> {
    index: &'i HierarchyIndex<'a>,
    visited: HashSet<String>,
}

impl<'i, 'a> HierarchyAssembler<'i, 'a> {
    pub fn new(index: &'i HierarchyIndex<'a>) -> Self {
        Self {
            index,
            visited: HashSet::new(),
        }
    }

    /// Build one tree per root product
    pub fn build<I, S>(&mut self, roots: I) -> Vec<ProductNode>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        roots
            .into_iter()
            .map(|root| self.build_node(root.as_ref()))
            .collect()
    }

    #[cfg(test)]
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn build_node(&mut self, product_id: &str) -> ProductNode {
        let index = self.index;

        if self.visited.contains(product_id) {
            debug!("Product {} already expanded, emitting stub", product_id);
            return ProductNode {
                entity: schema::PRODUCT,
                record: index.best_known_product(product_id),
                stub: true,
                children: ProductChildren::default(),
            };
        }
        self.visited.insert(product_id.to_string());

        let record = index.best_known_product(product_id);
        let mut children = ProductChildren::default();

        match key(&record, fields::PRODUCT_SPEC) {
            Some(spec_id) => children.product_spec = Some(Box::new(self.build_node(&spec_id))),
            None => {
                children.products = index
                    .child_products(product_id)
                    .iter()
                    .map(|child_id| self.build_node(child_id))
                    .collect();
            }
        }

        let object_class_id = key(&record, fields::OBJECT_TYPE);
        children.object_class = object_class_id.as_deref().and_then(|id| self.object_class(id));
        children.attributes = self.attributes(product_id);
        children.overrides = index
            .children(schema::OVERRIDES_BY_PRODUCT, product_id)
            .iter()
            .map(|record| RecordNode {
                entity: schema::OVERRIDE_DEFINITION,
                record: (*record).clone(),
            })
            .collect();
        children.relationships = self.action_owners(
            schema::RELATIONSHIPS_BY_PRODUCT,
            schema::ACTIONS_BY_RELATIONSHIP,
            product_id,
        );
        children.procedures = self.action_owners(
            schema::PROCEDURES_BY_PRODUCT,
            schema::ACTIONS_BY_PROCEDURE,
            product_id,
        );
        children.pricing = self.price_entries(product_id);
        children.layouts = object_class_id
            .as_deref()
            .map(|id| self.layouts(id))
            .unwrap_or_default();

        ProductNode {
            entity: schema::PRODUCT,
            record,
            stub: false,
            children,
        }
    }

    fn attributes(&self, product_id: &str) -> Vec<AttributeBundle> {
        self.index
            .children(schema::ASSIGNMENTS_BY_PRODUCT, product_id)
            .iter()
            .map(|assignment| AttributeBundle {
                entity: schema::ATTRIBUTE_ASSIGNMENT,
                record: (*assignment).clone(),
                attribute: self
                    .index
                    .follow(schema::ATTRIBUTE, assignment, fields::ATTRIBUTE)
                    .cloned(),
                category: self
                    .index
                    .follow(schema::ATTRIBUTE_CATEGORY, assignment, fields::ATTRIBUTE_CATEGORY)
                    .cloned(),
            })
            .collect()
    }

    /// Relationships or procedures of a product with their rule actions
    fn action_owners(&self, owners: Relation, actions: Relation, product_id: &str) -> Vec<ActionOwnerBundle> {
        self.index
            .children(owners, product_id)
            .iter()
            .map(|owner| {
                let rule_actions: Vec<RuleActionBundle> = record_id(owner)
                    .map(|owner_id| {
                        self.index
                            .children(actions, owner_id)
                            .iter()
                            .map(|action| self.rule_action(action))
                            .collect()
                    })
                    .unwrap_or_default();
                ActionOwnerBundle {
                    entity: owners.child,
                    record: (*owner).clone(),
                    rule_actions,
                }
            })
            .collect()
    }

    fn rule_action(&self, action: &serde_json::Value) -> RuleActionBundle {
        let mut bundle = RuleActionBundle {
            entity: schema::RULE_ACTION,
            record: action.clone(),
            rule: None,
            rule_variables: Vec::new(),
            rule_filters: Vec::new(),
            action_entity_filter: None,
        };

        if let Some(rule_id) = key(action, fields::RULE) {
            if let Some(rule) = self.index.lookup(schema::RULE, Some(&rule_id)) {
                bundle.rule = Some(rule.clone());
                bundle.rule_variables = owned(self.index.children(schema::VARIABLES_BY_RULE, &rule_id));
                bundle.rule_filters = self
                    .index
                    .children(schema::FILTERS_BY_RULE, &rule_id)
                    .iter()
                    .map(|filter| RuleFilterBundle {
                        record: (*filter).clone(),
                        entity_filter: key(filter, fields::ENTITY_FILTER)
                            .and_then(|id| self.entity_filter(&id)),
                    })
                    .collect();
            }
        }

        bundle.action_entity_filter =
            key(action, fields::ENTITY_FILTER).and_then(|id| self.entity_filter(&id));
        bundle
    }

    fn entity_filter(&self, filter_id: &str) -> Option<EntityFilterBundle> {
        let record = self.index.lookup(schema::ENTITY_FILTER, Some(filter_id))?;
        let conditions = self.index.children(schema::CONDITIONS_BY_FILTER, filter_id);

        let arguments_by_condition: BTreeMap<String, Vec<serde_json::Value>> = conditions
            .iter()
            .filter_map(|condition| record_id(condition))
            .map(|condition_id| {
                (
                    condition_id.to_string(),
                    owned(self.index.children(schema::ARGUMENTS_BY_CONDITION, condition_id)),
                )
            })
            .collect();

        Some(EntityFilterBundle {
            record: record.clone(),
            conditions: owned(conditions),
            members: owned(self.index.children(schema::MEMBERS_BY_FILTER, filter_id)),
            arguments_by_condition,
        })
    }

    fn price_entries(&self, product_id: &str) -> Vec<PriceEntryBundle> {
        self.index
            .children(schema::PRICE_ENTRIES_BY_PRODUCT, product_id)
            .iter()
            .map(|entry| {
                let element = self
                    .index
                    .follow(schema::PRICING_ELEMENT, entry, fields::PRICING_ELEMENT);
                let variable_id = key(entry, fields::ELEMENT_PRICING_VARIABLE)
                    .or_else(|| element.and_then(|e| key(e, fields::PRICING_VARIABLE)));
                let variable = self
                    .index
                    .lookup(schema::PRICING_VARIABLE, variable_id.as_deref());
                let bindings = variable_id
                    .as_deref()
                    .map(|id| owned(self.index.children(schema::BINDINGS_BY_VARIABLE, id)))
                    .unwrap_or_default();

                PriceEntryBundle {
                    entity: schema::PRICE_LIST_ENTRY,
                    record: (*entry).clone(),
                    pricing_element: element.cloned(),
                    pricing_variable: variable.cloned(),
                    bindings,
                }
            })
            .collect()
    }

    fn layouts(&self, object_class_id: &str) -> Vec<LayoutBundle> {
        let index = self.index;
        index
            .children(schema::LAYOUTS_BY_OBJECT_CLASS, object_class_id)
            .iter()
            .map(|layout| {
                let facets: Vec<FacetBundle> = record_id(layout)
                    .map(|layout_id| index.children(schema::FACETS_BY_LAYOUT, layout_id))
                    .unwrap_or(&[])
                    .iter()
                    .map(|facet| {
                        let sections: Vec<SectionBundle> = record_id(facet)
                            .map(|facet_id| index.children(schema::SECTIONS_BY_FACET, facet_id))
                            .unwrap_or(&[])
                            .iter()
                            .map(|section| SectionBundle {
                                entity: schema::OBJECT_SECTION,
                                record: (*section).clone(),
                                ui_section: index
                                    .follow(schema::UI_SECTION, section, fields::UI_SECTION)
                                    .cloned(),
                                elements: record_id(section)
                                    .map(|id| owned(index.children(schema::ELEMENTS_BY_SECTION, id)))
                                    .unwrap_or_default(),
                            })
                            .collect();
                        FacetBundle {
                            entity: schema::OBJECT_FACET,
                            record: (*facet).clone(),
                            ui_facet: index.follow(schema::UI_FACET, facet, fields::UI_FACET).cloned(),
                            sections,
                        }
                    })
                    .collect();
                LayoutBundle {
                    entity: schema::OBJECT_LAYOUT,
                    record: (*layout).clone(),
                    facets,
                }
            })
            .collect()
    }

    fn object_class(&self, object_class_id: &str) -> Option<ObjectClassBundle> {
        let record = self.index.lookup(schema::OBJECT_CLASS, Some(object_class_id));
        let field_attributes = self.attribute_group(
            self.index
                .children(schema::FIELD_ATTRIBUTES_BY_OBJECT_CLASS, object_class_id),
        );
        let attribute_bindings = self.attribute_group(
            self.index
                .children(schema::BINDINGS_BY_OBJECT_CLASS, object_class_id),
        );

        if record.is_none() && field_attributes.is_empty() && attribute_bindings.is_empty() {
            return None;
        }

        Some(ObjectClassBundle {
            record: record.cloned(),
            field_attributes,
            attribute_bindings,
        })
    }

    fn attribute_group(&self, records: &[&serde_json::Value]) -> AttributeGroup {
        let records = dedupe_by_id(records.iter().copied());

        let attributes = dedupe_by_id(
            records
                .iter()
                .filter_map(|r| self.index.follow(schema::ATTRIBUTE, r, fields::ATTRIBUTE)),
        );
        let categories = dedupe_by_id(records.iter().filter_map(|r| {
            self.index
                .follow(schema::ATTRIBUTE_CATEGORY, r, fields::ATTRIBUTE_CATEGORY)
        }));
        let picklists = dedupe_by_id(
            attributes
                .iter()
                .filter_map(|a| self.index.follow(schema::PICKLIST, a, fields::PICKLIST)),
        );

        AttributeGroup {
            records: owned(&records),
            attributes: owned(&attributes),
            categories: owned(&categories),
            picklists: owned(&picklists),
        }
    }
}
