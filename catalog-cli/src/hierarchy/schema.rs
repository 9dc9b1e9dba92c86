//! Entity names and foreign keys used to assemble the product tree

pub const PRODUCT: &str = "Product2";
pub const PRODUCT_CHILD_ITEM: &str = "ProductChildItem";
pub const OBJECT_CLASS: &str = "ObjectClass";
pub const OBJECT_FIELD_ATTRIBUTE: &str = "ObjectFieldAttribute";
pub const ATTRIBUTE_BINDING: &str = "AttributeBinding";
pub const ATTRIBUTE_ASSIGNMENT: &str = "AttributeAssignment";
pub const OVERRIDE_DEFINITION: &str = "OverrideDefinition";
pub const PRODUCT_RELATIONSHIP: &str = "ProductRelationship";
pub const PROCEDURE: &str = "ProductConfigurationProcedure";
pub const RULE_ACTION: &str = "RuleAction";
pub const RULE: &str = "Rule";
pub const RULE_VARIABLE: &str = "RuleVariable";
pub const RULE_FILTER: &str = "RuleFilter";
pub const ENTITY_FILTER: &str = "EntityFilter";
pub const ENTITY_FILTER_CONDITION: &str = "EntityFilterCondition";
pub const ENTITY_FILTER_MEMBER: &str = "EntityFilterMember";
pub const ENTITY_FILTER_ARGUMENT: &str = "EntityFilterConditionArgument";
pub const PRICE_LIST_ENTRY: &str = "PriceListEntry";
pub const PRICING_ELEMENT: &str = "PricingElement";
pub const PRICING_VARIABLE: &str = "PricingVariable";
pub const PRICING_VARIABLE_BINDING: &str = "PricingVariableBinding";
pub const OBJECT_LAYOUT: &str = "ObjectLayout";
pub const OBJECT_FACET: &str = "ObjectFacet";
pub const OBJECT_SECTION: &str = "ObjectSection";
pub const OBJECT_ELEMENT: &str = "ObjectElement";
pub const UI_FACET: &str = "UIFacet";
pub const UI_SECTION: &str = "UISection";
pub const ATTRIBUTE: &str = "Attribute";
pub const ATTRIBUTE_CATEGORY: &str = "AttributeCategory";
pub const PICKLIST: &str = "Picklist";
pub const CALCULATION_MATRIX: &str = "CalculationMatrix";
pub const CALCULATION_MATRIX_VERSION: &str = "CalculationMatrixVersion";
pub const CALCULATION_MATRIX_ROW: &str = "CalculationMatrixRow";
pub const CALCULATION_PROCEDURE: &str = "CalculationProcedure";
pub const CALCULATION_PROCEDURE_VERSION: &str = "CalculationProcedureVersion";
pub const CALCULATION_PROCEDURE_STEP: &str = "CalculationProcedureStep";

pub mod fields {
    pub const NAME: &str = "Name";
    pub const PARENT_PRODUCT: &str = "vlocity_cmt__ParentProductId__c";
    pub const CHILD_PRODUCT: &str = "vlocity_cmt__ChildProductId__c";
    pub const PARENT_PRODUCT_NAME: &str = "vlocity_cmt__ParentProductId__r.Name";
    pub const CHILD_PRODUCT_NAME: &str = "vlocity_cmt__ChildProductId__r.Name";
    pub const PRODUCT_SPEC: &str = "vlocity_cmt__ProductSpecId__c";
    pub const PRODUCT_SPEC_NAME: &str = "vlocity_cmt__ProductSpecId__r.Name";
    pub const OBJECT_TYPE: &str = "vlocity_cmt__ObjectTypeId__c";
    pub const OBJECT_CLASS: &str = "vlocity_cmt__ObjectClassId__c";
    pub const ATTRIBUTE: &str = "vlocity_cmt__AttributeId__c";
    pub const ATTRIBUTE_CATEGORY: &str = "vlocity_cmt__AttributeCategoryId__c";
    pub const PICKLIST: &str = "vlocity_cmt__PicklistId__c";
    pub const RULE: &str = "vlocity_cmt__RuleId__c";
    pub const ENTITY_FILTER: &str = "vlocity_cmt__EntityFilterId__c";
    pub const PRICING_ELEMENT: &str = "vlocity_cmt__PricingElementId__c";
    pub const PRICING_VARIABLE: &str = "vlocity_cmt__PricingVariableId__c";
    pub const ELEMENT_PRICING_VARIABLE: &str =
        "vlocity_cmt__PricingElementId__r.vlocity_cmt__PricingVariableId__c";
    pub const UI_FACET: &str = "vlocity_cmt__FacetId__c";
    pub const UI_SECTION: &str = "vlocity_cmt__SectionId__c";
}

/// A child entity pointing at its parent through `field`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    pub child: &'static str,
    pub field: &'static str,
}

impl Relation {
    pub const fn new(child: &'static str, field: &'static str) -> Self {
        Self { child, field }
    }
}

pub const ASSIGNMENTS_BY_PRODUCT: Relation =
    Relation::new(ATTRIBUTE_ASSIGNMENT, "vlocity_cmt__ObjectId__c");
pub const OVERRIDES_BY_PRODUCT: Relation =
    Relation::new(OVERRIDE_DEFINITION, "vlocity_cmt__ProductId__c");
pub const RELATIONSHIPS_BY_PRODUCT: Relation =
    Relation::new(PRODUCT_RELATIONSHIP, "vlocity_cmt__Product2Id__c");
pub const PROCEDURES_BY_PRODUCT: Relation = Relation::new(PROCEDURE, "vlocity_cmt__ProductId__c");
pub const ACTIONS_BY_RELATIONSHIP: Relation =
    Relation::new(RULE_ACTION, "vlocity_cmt__ProductRelationshipId__c");
pub const ACTIONS_BY_PROCEDURE: Relation =
    Relation::new(RULE_ACTION, "vlocity_cmt__ProductConfigurationProcedureId__c");
pub const VARIABLES_BY_RULE: Relation = Relation::new(RULE_VARIABLE, fields::RULE);
pub const FILTERS_BY_RULE: Relation = Relation::new(RULE_FILTER, fields::RULE);
pub const CONDITIONS_BY_FILTER: Relation =
    Relation::new(ENTITY_FILTER_CONDITION, fields::ENTITY_FILTER);
pub const MEMBERS_BY_FILTER: Relation = Relation::new(ENTITY_FILTER_MEMBER, fields::ENTITY_FILTER);
pub const ARGUMENTS_BY_CONDITION: Relation =
    Relation::new(ENTITY_FILTER_ARGUMENT, "vlocity_cmt__FilterConditionId__c");
pub const PRICE_ENTRIES_BY_PRODUCT: Relation =
    Relation::new(PRICE_LIST_ENTRY, "vlocity_cmt__ProductId__c");
pub const BINDINGS_BY_VARIABLE: Relation =
    Relation::new(PRICING_VARIABLE_BINDING, fields::PRICING_VARIABLE);
pub const LAYOUTS_BY_OBJECT_CLASS: Relation = Relation::new(OBJECT_LAYOUT, fields::OBJECT_CLASS);
pub const FACETS_BY_LAYOUT: Relation = Relation::new(OBJECT_FACET, "vlocity_cmt__ObjectLayoutId__c");
pub const SECTIONS_BY_FACET: Relation =
    Relation::new(OBJECT_SECTION, "vlocity_cmt__ObjectFacetId__c");
pub const ELEMENTS_BY_SECTION: Relation =
    Relation::new(OBJECT_ELEMENT, "vlocity_cmt__ObjectSectionId__c");
pub const FIELD_ATTRIBUTES_BY_OBJECT_CLASS: Relation =
    Relation::new(OBJECT_FIELD_ATTRIBUTE, fields::OBJECT_CLASS);
pub const BINDINGS_BY_OBJECT_CLASS: Relation = Relation::new(ATTRIBUTE_BINDING, fields::OBJECT_CLASS);
pub const MATRIX_VERSIONS_BY_MATRIX: Relation =
    Relation::new(CALCULATION_MATRIX_VERSION, "vlocity_cmt__CalculationMatrixId__c");
pub const MATRIX_ROWS_BY_VERSION: Relation =
    Relation::new(CALCULATION_MATRIX_ROW, "vlocity_cmt__CalculationMatrixVersionId__c");
pub const PROCEDURE_VERSIONS_BY_PROCEDURE: Relation =
    Relation::new(CALCULATION_PROCEDURE_VERSION, "vlocity_cmt__CalculationProcedureId__c");
pub const PROCEDURE_STEPS_BY_VERSION: Relation =
    Relation::new(CALCULATION_PROCEDURE_STEP, "vlocity_cmt__CalculationProcedureVersionId__c");

/// Foreign keys indexed for the product tree
pub const TREE_RELATIONS: &[Relation] = &[
    ASSIGNMENTS_BY_PRODUCT,
    OVERRIDES_BY_PRODUCT,
    RELATIONSHIPS_BY_PRODUCT,
    PROCEDURES_BY_PRODUCT,
    ACTIONS_BY_RELATIONSHIP,
    ACTIONS_BY_PROCEDURE,
    VARIABLES_BY_RULE,
    FILTERS_BY_RULE,
    CONDITIONS_BY_FILTER,
    MEMBERS_BY_FILTER,
    ARGUMENTS_BY_CONDITION,
    PRICE_ENTRIES_BY_PRODUCT,
    BINDINGS_BY_VARIABLE,
    LAYOUTS_BY_OBJECT_CLASS,
    FACETS_BY_LAYOUT,
    SECTIONS_BY_FACET,
    ELEMENTS_BY_SECTION,
    FIELD_ATTRIBUTES_BY_OBJECT_CLASS,
    BINDINGS_BY_OBJECT_CLASS,
];

/// Entities resolved by id from other records
pub const LOOKUP_ENTITIES: &[&str] = &[
    RULE,
    ENTITY_FILTER,
    ATTRIBUTE,
    ATTRIBUTE_CATEGORY,
    PRICING_ELEMENT,
    PRICING_VARIABLE,
    UI_FACET,
    UI_SECTION,
    OBJECT_CLASS,
    PICKLIST,
];
