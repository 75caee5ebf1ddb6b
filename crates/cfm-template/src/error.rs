//! Structural errors raised while decoding template text.

/// Problems found while turning raw template text into a [`crate::TemplateBody`].
///
/// These cover malformed documents only. A well-formed document that uses an
/// intrinsic we do not understand is not an error; it decodes to
/// [`crate::Expr::Unknown`] so later phases can report it.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The document is not valid JSON.
    #[error("template is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not valid YAML.
    #[error("template is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The top level of the document is not a JSON object.
    #[error("template root must be an object, found {found}")]
    RootNotObject {
        /// Short name of the value kind actually found.
        found: &'static str,
    },

    /// A section that must be an object held something else.
    #[error("template section `{section}` must be an object")]
    SectionNotObject {
        /// Section name as written in the template.
        section: String,
    },

    /// A resource definition is missing its `Type` field.
    #[error("resource `{logical_id}` has no Type")]
    MissingResourceType {
        /// Logical id of the offending resource.
        logical_id: String,
    },

    /// A `DependsOn` entry was neither a string nor a list of strings.
    #[error("resource `{logical_id}` has a malformed DependsOn")]
    MalformedDependsOn {
        /// Logical id of the offending resource.
        logical_id: String,
    },

    /// An output definition is missing its `Value` field.
    #[error("output `{name}` has no Value")]
    MissingOutputValue {
        /// Name of the offending output.
        name: String,
    },

    /// A YAML mapping used a key that cannot be represented as a string.
    #[error("YAML mapping key is not a string")]
    NonStringKey,

    /// A YAML number could not be represented in JSON.
    #[error("YAML number `{0}` has no JSON representation")]
    UnrepresentableNumber(String),
}
