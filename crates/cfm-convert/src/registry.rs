//! The type mapping registry.
//!
//! Maps source resource types to target-schema types. The registry is built
//! once (usually via [`TypeRegistry::builtin`]) and passed around by shared
//! reference; nothing mutates it after construction.

use cfm_model::{names, LifecycleTier, PropertyValue};
use indexmap::IndexMap;

/// How the importable identifying value of a resource is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportIdentity {
    /// The physical id is the identifier (the common case).
    PhysicalId,
    /// A resolved literal property is the identifier, e.g. a bucket name.
    Property(&'static str),
    /// Several parts joined with a separator, the form association-style
    /// resources import with. Every part must resolve to a literal.
    Compound {
        /// Ordered identifier parts.
        parts: &'static [IdPart],
        /// Separator between parts, usually `/`.
        separator: &'static str,
    },
}

/// One part of a compound import identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPart {
    /// The resource's own physical id.
    PhysicalId,
    /// A resolved literal property, named in source-schema form.
    Property(&'static str),
}

/// Selects a target type from resolved properties when one source type maps
/// to several target types.
pub type Discriminator = fn(&IndexMap<String, PropertyValue>) -> &'static str;

/// Reshapes mapped properties in place for types whose schemas differ
/// structurally, beyond simple renames.
pub type Reshape = fn(&mut IndexMap<String, PropertyValue>);

/// One registry entry: everything the engine knows about a source type.
#[derive(Debug, Clone)]
pub struct TypeMapping {
    /// Target type name, e.g. `aws_subnet`.
    pub target_type: &'static str,
    /// Target attribute a plain reference to this resource yields.
    pub id_attribute: &'static str,
    /// Source attribute name to target attribute name, for attribute
    /// references. Anything absent falls back to CamelCase-to-snake_case.
    pub attribute_renames: &'static [(&'static str, &'static str)],
    /// Source property name to target property name. Anything absent falls
    /// back to CamelCase-to-snake_case.
    pub property_renames: &'static [(&'static str, &'static str)],
    /// Source properties with no target counterpart, dropped during mapping.
    pub drop_properties: &'static [&'static str],
    /// Target properties the schema requires. Used by the conformance
    /// check; absence is a finding, not an error.
    pub required: &'static [&'static str],
    /// Change-frequency tier, used by the by-lifecycle strategy.
    pub lifecycle: LifecycleTier,
    /// How the import identifier is derived.
    pub import_identity: ImportIdentity,
    /// Target-type discriminator for one-to-many mappings.
    pub discriminator: Option<Discriminator>,
    /// Structural reshape hook, run after renames.
    pub reshape: Option<Reshape>,
}

impl TypeMapping {
    /// A minimal mapping: snake_case renames only, physical-id import,
    /// support lifecycle.
    #[must_use]
    pub const fn simple(target_type: &'static str) -> Self {
        Self {
            target_type,
            id_attribute: "id",
            attribute_renames: &[],
            property_renames: &[],
            drop_properties: &[],
            required: &[],
            lifecycle: LifecycleTier::Support,
            import_identity: ImportIdentity::PhysicalId,
            discriminator: None,
            reshape: None,
        }
    }

    /// The target type for a concrete resource, honoring the discriminator.
    #[must_use]
    pub fn target_for(&self, resolved: &IndexMap<String, PropertyValue>) -> &'static str {
        match self.discriminator {
            Some(choose) => choose(resolved),
            None => self.target_type,
        }
    }

    /// Maps a source attribute name to its target spelling.
    #[must_use]
    pub fn map_attribute(&self, attribute: &str) -> String {
        for (source, target) in self.attribute_renames {
            if *source == attribute {
                return (*target).to_string();
            }
        }
        names::camel_to_snake(attribute)
    }

    /// Maps a source property name to its target spelling.
    #[must_use]
    pub fn map_property(&self, property: &str) -> String {
        for (source, target) in self.property_renames {
            if *source == property {
                return (*target).to_string();
            }
        }
        names::camel_to_snake(property)
    }
}

/// Immutable registry keyed by source type name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: IndexMap<String, TypeMapping>,
}

impl TypeRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Create registry with the built-in mapping table
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (source_type, mapping) in crate::builtin::MAPPINGS {
            registry.register(source_type, mapping.clone());
        }
        registry
    }

    /// Register a mapping for a source type
    pub fn register(&mut self, source_type: &str, mapping: TypeMapping) {
        self.entries.insert(source_type.to_string(), mapping);
    }

    /// Look up the mapping for a source type
    #[inline]
    #[must_use]
    pub fn get(&self, source_type: &str) -> Option<&TypeMapping> {
        self.entries.get(source_type)
    }

    /// Check if a source type is supported
    #[inline]
    #[must_use]
    pub fn contains(&self, source_type: &str) -> bool {
        self.entries.contains_key(source_type)
    }

    /// Get number of registered source types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over source type names
    pub fn source_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The target attribute a plain reference to this source type produces,
    /// `id` when unknown.
    #[must_use]
    pub fn id_attribute(&self, source_type: &str) -> &'static str {
        self.get(source_type).map_or("id", |m| m.id_attribute)
    }

    /// Maps an attribute name for a source type, falling back to
    /// CamelCase-to-snake_case when the type is unknown.
    #[must_use]
    pub fn map_attribute(&self, source_type: &str, attribute: &str) -> String {
        match self.get(source_type) {
            Some(mapping) => mapping.map_attribute(attribute),
            None => names::camel_to_snake(attribute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_new_empty() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn registry_builtin_is_populated() {
        let registry = TypeRegistry::builtin();
        assert!(!registry.is_empty());
        assert!(registry.contains("AWS::EC2::VPC"));
        assert!(registry.contains("AWS::S3::Bucket"));
        assert!(!registry.contains("Custom::Widget"));
    }

    #[test]
    fn registry_register_custom() {
        let mut registry = TypeRegistry::new();
        registry.register("Custom::Widget", TypeMapping::simple("vendor_widget"));
        assert!(registry.contains("Custom::Widget"));
        assert_eq!(registry.get("Custom::Widget").unwrap().target_type, "vendor_widget");
    }

    #[test]
    fn attribute_mapping_prefers_renames() {
        let registry = TypeRegistry::builtin();
        // Explicit rename on the RDS instance entry.
        assert_eq!(
            registry.map_attribute("AWS::RDS::DBInstance", "Endpoint.Address"),
            "address"
        );
        // Fallback is snake_case.
        assert_eq!(registry.map_attribute("AWS::EC2::VPC", "CidrBlock"), "cidr_block");
        assert_eq!(registry.map_attribute("Unknown::Type", "Arn"), "arn");
    }

    #[test]
    fn id_attribute_defaults_to_id() {
        let registry = TypeRegistry::builtin();
        assert_eq!(registry.id_attribute("AWS::EC2::VPC"), "id");
        assert_eq!(registry.id_attribute("AWS::EC2::EIP"), "public_ip");
        assert_eq!(registry.id_attribute("Unknown::Type"), "id");
    }

    #[test]
    fn discriminator_overrides_target_type() {
        let registry = TypeRegistry::builtin();
        let mapping = registry.get("AWS::IAM::Policy").unwrap();

        let standalone: IndexMap<String, PropertyValue> = IndexMap::new();
        assert_eq!(mapping.target_for(&standalone), "aws_iam_policy");

        let mut attached = IndexMap::new();
        attached.insert(
            "Roles".to_string(),
            PropertyValue::List(vec![PropertyValue::from("my-role")]),
        );
        assert_eq!(mapping.target_for(&attached), "aws_iam_role_policy");
    }
}
