//! Audit object naming rules

const CUSTOM_SUFFIX: &str = "__c";

/// Whether an API name denotes a custom object
pub fn is_custom_object(api_name: &str) -> bool {
    api_name.len() > CUSTOM_SUFFIX.len() && api_name.ends_with(CUSTOM_SUFFIX)
}

/// Field history object for an object: `Foo__c` → `Foo__History`,
/// `Product2` → `Product2History`
pub fn derive_history_object_name(api_name: &str) -> String {
    match api_name.strip_suffix(CUSTOM_SUFFIX) {
        Some(stem) if !stem.is_empty() => format!("{}__History", stem),
        _ => format!("{}History", api_name),
    }
}

/// Field on the history object pointing at the changed record:
/// `ParentId` for custom objects, `<Object>Id` for standard ones
pub fn history_owner_field(api_name: &str) -> String {
    if is_custom_object(api_name) {
        "ParentId".to_string()
    } else {
        format!("{}Id", api_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_object_naming() {
        assert_eq!(derive_history_object_name("Foo__c"), "Foo__History");
        assert_eq!(
            derive_history_object_name("vlocity_cmt__Attribute__c"),
            "vlocity_cmt__Attribute__History"
        );
        assert_eq!(history_owner_field("Foo__c"), "ParentId");
    }

    #[test]
    fn test_standard_object_naming() {
        assert_eq!(derive_history_object_name("Product2"), "Product2History");
        assert_eq!(history_owner_field("Product2"), "Product2Id");
        assert!(!is_custom_object("Product2"));
        assert!(!is_custom_object("__c"));
    }
}
