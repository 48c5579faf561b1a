//! Core data types used throughout tfinspect.
//!
//! This module defines the in-memory model of one configuration directory:
//! - [`Module`] and the elements it declares (variables, outputs, resources,
//!   module calls, provider requirements)
//! - [`AttributeValue`], the classified right-hand side of an argument
//! - [`ReportFormat`] for rendering
//!
//! Maps are plain `HashMap`s; they serialize in key order and every traversal
//! in the pipeline goes through [`crate::ordered::sorted_keys`].

use crate::diagnostics::Diagnostics;
use crate::ordered::serialize_sorted;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// The resolved representation of one configuration directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Module {
    /// Directory the module was loaded from
    pub path: String,

    /// Declared input variables, keyed by name
    #[serde(serialize_with = "serialize_sorted")]
    pub variables: HashMap<String, Variable>,

    /// Declared outputs, keyed by name
    #[serde(serialize_with = "serialize_sorted")]
    pub outputs: HashMap<String, Output>,

    /// `terraform { required_version }` constraints
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_core: Vec<String>,

    /// Provider requirements, explicit or implied by resources
    #[serde(serialize_with = "serialize_sorted")]
    pub required_providers: HashMap<String, ProviderRequirement>,

    /// `provider` configuration blocks, keyed by `name` or `name.alias`
    #[serde(
        serialize_with = "serialize_sorted",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub provider_configs: HashMap<String, ProviderConfig>,

    /// Managed resources, keyed by `type.name`
    #[serde(serialize_with = "serialize_sorted")]
    pub managed_resources: HashMap<String, Resource>,

    /// Data sources, keyed by `data.type.name`
    #[serde(serialize_with = "serialize_sorted")]
    pub data_resources: HashMap<String, Resource>,

    /// Child module calls, keyed by local call name
    #[serde(serialize_with = "serialize_sorted")]
    pub module_calls: HashMap<String, ModuleCall>,

    /// Problems found while loading and enriching this module
    pub diagnostics: Diagnostics,
}

impl Module {
    /// Create an empty module for the given directory.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Finish a front-end load: every resource's provider gets a requirement
    /// entry (empty if undeclared) and the load diagnostics are attached.
    pub fn init(&mut self, diagnostics: Diagnostics) {
        let implied: Vec<String> = self
            .managed_resources
            .values()
            .chain(self.data_resources.values())
            .map(|r| r.provider.name.clone())
            .collect();
        for name in implied {
            self.required_providers.entry(name).or_default();
        }
        self.diagnostics = diagnostics;
    }

    /// Total number of resources and data sources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.managed_resources.len() + self.data_resources.len()
    }
}

/// A declared input variable.
///
/// # Example HCL
///
/// ```hcl
/// variable "rg_id" {
///   type        = string
///   description = "Resource group"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,

    /// Type constraint as written (`string`, `list(string)`, ...)
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Default value converted to JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,

    /// Where this variable's value is consumed, sorted
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<SourcePos>,

    /// Alternative names for the variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,

    /// Cloud data type tag, e.g. `resource_group_id`, `region`, `vpc_id`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cloud_data_type: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub link_status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub immutable: Option<bool>,

    /// Not displayed on UI or command line when true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Comma separated list of allowed values
    #[serde(rename = "options", skip_serializing_if = "String::is_empty")]
    pub allowed_values: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub min_value: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub max_value: String,

    /// Minimum length of a string value
    #[serde(rename = "min_length", skip_serializing_if = "Option::is_none")]
    pub min_value_length: Option<serde_json::Value>,

    /// Maximum length of a string value
    #[serde(rename = "max_length", skip_serializing_if = "Option::is_none")]
    pub max_value_length: Option<serde_json::Value>,

    /// Regex the value must match
    #[serde(skip_serializing_if = "String::is_empty")]
    pub matches: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed: Option<bool>,

    /// Element schema for collection types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elem: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<i64>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub deprecated: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cloud_data_range: Vec<serde_json::Value>,
}

impl Variable {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append provenance entries and keep the list sorted and unique.
    pub fn add_sources<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source.extend(entries.into_iter().map(Into::into));
        crate::ordered::normalize_sources(&mut self.source);
    }
}

/// A declared output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Output {
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Raw expression text of the `value` argument
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<SourcePos>,

    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub cloud_data_type: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cloud_data_range: Vec<serde_json::Value>,
}

impl Output {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append provenance entries and keep the list sorted and unique.
    pub fn add_sources<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source.extend(entries.into_iter().map(Into::into));
        crate::ordered::normalize_sources(&mut self.source);
    }
}

/// Whether a resource block is `resource` or `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    #[default]
    Managed,
    Data,
}

impl fmt::Display for ResourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Managed => write!(f, "managed"),
            Self::Data => write!(f, "data"),
        }
    }
}

/// A managed resource or data source.
///
/// # Example HCL
///
/// ```hcl
/// resource "ibm_is_vpc" "main" {
///   resource_group = var.rg_id
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resource {
    pub mode: ResourceMode,

    #[serde(rename = "type")]
    pub type_name: String,

    pub name: String,

    pub provider: ProviderRef,

    /// Top-level arguments, meta-arguments excluded
    #[serde(
        serialize_with = "serialize_sorted",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub attributes: HashMap<String, AttributeValue>,

    pub pos: SourcePos,
}

impl Resource {
    /// Map key of this resource: `type.name`, or `data.type.name`.
    #[must_use]
    pub fn address(&self) -> String {
        match self.mode {
            ResourceMode::Managed => format!("{}.{}", self.type_name, self.name),
            ResourceMode::Data => format!("data.{}.{}", self.type_name, self.name),
        }
    }

    /// Provenance entry for one of this resource's attributes.
    #[must_use]
    pub fn attribute_path(&self, attribute: &str) -> String {
        format!("{}.{attribute}", self.address())
    }
}

/// Provider reference of a resource (`provider = ibm.east`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderRef {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub alias: String,
}

impl ProviderRef {
    /// Provider implied by a resource type name: the text before the first `_`.
    #[must_use]
    pub fn implied_by(resource_type: &str) -> Self {
        let name = resource_type
            .split_once('_')
            .map_or(resource_type, |(prefix, _)| prefix);
        Self {
            name: name.to_string(),
            alias: String::new(),
        }
    }
}

/// A `module` block.
///
/// # Example HCL
///
/// ```hcl
/// module "db" {
///   source = "terraform-ibm-modules/db"
///   size   = var.db_size
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleCall {
    /// Local call name
    pub name: String,

    /// Source address as written
    pub source: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Bound arguments, meta-arguments excluded
    #[serde(
        serialize_with = "serialize_sorted",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub attributes: HashMap<String, AttributeValue>,

    /// Child module's managed resources, once resolved
    #[serde(serialize_with = "serialize_sorted")]
    pub managed_resources: HashMap<String, Resource>,

    /// Child module's data sources, once resolved
    #[serde(serialize_with = "serialize_sorted")]
    pub data_resources: HashMap<String, Resource>,

    /// Child module's outputs, once resolved
    #[serde(
        serialize_with = "serialize_sorted",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub outputs: HashMap<String, Output>,

    pub pos: SourcePos,
}

/// A provider requirement from `required_providers`, or an implied one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequirement {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_constraints: Vec<String>,
}

/// A `provider` configuration block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
}

/// File and line of a declaration's block header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePos {
    pub filename: String,
    pub line: usize,
}

/// Classified right-hand side of an argument.
///
/// Only [`AttributeValue::Variable`] takes part in provenance tracing.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// A bare `var.<name>` reference (or `"${var.<name>}"`)
    Variable(String),
    /// A constant value
    Literal(serde_json::Value),
    /// Any other expression, kept as source text
    Expression(String),
}

impl AttributeValue {
    /// Name of the referenced variable, if this is a plain variable reference.
    #[must_use]
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name) => write!(f, "var.{name}"),
            Self::Literal(value) => write!(f, "{value}"),
            Self::Expression(text) => write!(f, "{text}"),
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(value) => value.serialize(serializer),
            Self::Variable(_) | Self::Expression(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// JSON format
    #[default]
    Json,
    /// Human-readable tables
    Text,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;

    fn resource(mode: ResourceMode, type_name: &str, name: &str) -> Resource {
        Resource {
            mode,
            type_name: type_name.to_string(),
            name: name.to_string(),
            provider: ProviderRef::implied_by(type_name),
            ..Resource::default()
        }
    }

    #[test]
    fn test_init_adds_implied_providers() {
        let mut module = Module::new("root");
        module.required_providers.insert(
            "ibm".to_string(),
            ProviderRequirement {
                source: "IBM-Cloud/ibm".to_string(),
                version_constraints: vec![">= 1.50".to_string()],
            },
        );
        let vpc = resource(ResourceMode::Managed, "ibm_is_vpc", "main");
        let rand = resource(ResourceMode::Data, "random_id", "x");
        module.managed_resources.insert(vpc.address(), vpc);
        module.data_resources.insert(rand.address(), rand);

        module.init(Diagnostics::from(vec![Diagnostic::warning("w", "")]));

        assert_eq!(module.required_providers.len(), 2);
        assert_eq!(module.required_providers["ibm"].source, "IBM-Cloud/ibm");
        assert_eq!(
            module.required_providers["random"],
            ProviderRequirement::default()
        );
        assert_eq!(module.diagnostics.len(), 1);
    }

    #[test]
    fn test_resource_address_and_path() {
        let managed = resource(ResourceMode::Managed, "ibm_is_vpc", "main");
        assert_eq!(managed.address(), "ibm_is_vpc.main");
        assert_eq!(
            managed.attribute_path("resource_group"),
            "ibm_is_vpc.main.resource_group"
        );

        let data = resource(ResourceMode::Data, "ibm_resource_group", "rg");
        assert_eq!(data.attribute_path("name"), "data.ibm_resource_group.rg.name");
    }

    #[test]
    fn test_implied_provider() {
        assert_eq!(ProviderRef::implied_by("ibm_is_vpc").name, "ibm");
        assert_eq!(ProviderRef::implied_by("terraform").name, "terraform");
    }

    #[test]
    fn test_add_sources_sorted_and_unique() {
        let mut variable = Variable::new("rg_id");
        variable.add_sources(["module.db", "ibm_is_vpc.main.resource_group"]);
        variable.add_sources(["module.db"]);
        assert_eq!(
            variable.source,
            vec!["ibm_is_vpc.main.resource_group", "module.db"]
        );
    }

    #[test]
    fn test_variable_serializes_overlay_names() {
        let mut variable = Variable::new("region");
        variable.type_name = "string".to_string();
        variable.allowed_values = "us-south,eu-de".to_string();
        variable.min_value_length = Some(serde_json::json!(2));
        variable.required = Some(true);

        let json = serde_json::to_value(&variable).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "region",
                "type": "string",
                "required": true,
                "options": "us-south,eu-de",
                "min_length": 2
            })
        );
    }

    #[test]
    fn test_attribute_value_serialization() {
        let values = vec![
            AttributeValue::Variable("rg_id".to_string()),
            AttributeValue::Literal(serde_json::json!(3)),
            AttributeValue::Expression("local.tags".to_string()),
        ];
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, serde_json::json!(["var.rg_id", 3, "local.tags"]));
        assert_eq!(values[0].variable_name(), Some("rg_id"));
        assert_eq!(values[2].variable_name(), None);
    }
}
