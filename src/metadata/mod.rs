//! Provider schema metadata.
//!
//! The metadata document is a JSON object with two optional tables,
//! `Resources` and `Datasources`, mapping a resource type name to the list of
//! its attribute schemas:
//!
//! ```json
//! {
//!   "Resources": {
//!     "ibm_is_vpc": [
//!       { "name": "resource_group", "cloud_data_type": "resource_group_id" }
//!     ]
//!   },
//!   "Datasources": {}
//! }
//! ```
//!
//! Records are converted once into typed [`AttributeSchema`] values. A field
//! with an unexpected JSON shape is dropped and reported as a warning instead
//! of failing the whole document.

mod merge;
mod record;

pub use merge::{absorb_variable, apply_to_output, apply_to_variable, is_enrichable, MergePolicy};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{InspectError, Result};
use crate::ordered::serialize_sorted;
use record::{json_kind, RecordReader};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Summary used for dropped fields and records.
pub const SHAPE_WARNING: &str = "metadataShapeErr";

/// Top-level key of the resource table.
pub const RESOURCES_KEY: &str = "Resources";

/// Top-level key of the data source table.
pub const DATASOURCES_KEY: &str = "Datasources";

/// Which table of the document to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaTable {
    Resources,
    Datasources,
}

impl fmt::Display for SchemaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resources => write!(f, "{RESOURCES_KEY}"),
            Self::Datasources => write!(f, "{DATASOURCES_KEY}"),
        }
    }
}

/// Schema of one resource or data source attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeSchema {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    /// Comma separated allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elem: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immutable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    /// Maps onto `sensitive`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_data_range: Option<Vec<Value>>,
}

impl AttributeSchema {
    /// Read one record. `None` when the record has no usable `name`.
    fn from_record(
        type_name: &str,
        fields: &Map<String, Value>,
        issues: &mut Vec<InspectError>,
    ) -> Option<Self> {
        let label_name = fields.get("name").and_then(Value::as_str).unwrap_or("?");
        let mut reader = RecordReader::new(format!("{type_name}.{label_name}"), fields);

        let name = reader.string("name");
        let schema = name.map(|name| Self {
            name,
            aliases: reader.string_list("aliases"),
            options: reader.string("options"),
            cloud_data_type: reader.string("cloud_data_type"),
            computed: reader.boolean("computed"),
            default: reader.any("default"),
            description: reader.string("description"),
            elem: reader.any("elem"),
            hidden: reader.boolean("hidden"),
            immutable: reader.boolean("immutable"),
            link_status: reader.string("link_status"),
            matches: reader.string("matches"),
            max_items: reader.integer("max_items"),
            max_value: reader.string_or_number("max_value"),
            min_items: reader.integer("min_items"),
            min_value: reader.string_or_number("min_value"),
            min_length: reader.any("min_length"),
            max_length: reader.any("max_length"),
            required: reader.boolean("required"),
            optional: reader.boolean("optional"),
            secure: reader.boolean("secure"),
            deprecated: reader.string("deprecated"),
            cloud_data_range: reader.array("cloud_data_range"),
        });

        let mut record_issues = reader.into_issues();
        if schema.is_none() && record_issues.is_empty() {
            record_issues.push(crate::err!(MetadataShape {
                record: format!("{type_name}.{label_name}"),
                field: "name".to_string(),
                expected: "string",
                found: "null",
            }));
        }
        issues.extend(record_issues);
        schema
    }
}

/// A parsed metadata document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderMetadata {
    #[serde(rename = "Resources", serialize_with = "serialize_sorted")]
    resources: HashMap<String, Vec<AttributeSchema>>,

    #[serde(rename = "Datasources", serialize_with = "serialize_sorted")]
    datasources: HashMap<String, Vec<AttributeSchema>>,

    #[serde(skip)]
    warnings: Diagnostics,
}

impl ProviderMetadata {
    /// Read and parse a metadata document from disk.
    ///
    /// # Errors
    ///
    /// `MetadataRead` if the file cannot be read, `MetadataParse` if it is not
    /// a JSON object.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            crate::err!(MetadataRead {
                path: path.to_path_buf(),
                source: source,
            })
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            crate::err!(MetadataParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })?;
        let metadata = Self::from_value(&value, path)?;
        tracing::debug!(
            path = %path.display(),
            resources = metadata.resources.len(),
            datasources = metadata.datasources.len(),
            warnings = metadata.warnings.len(),
            "Loaded provider metadata"
        );
        Ok(metadata)
    }

    /// Build from an already parsed JSON value. `label` names the document in
    /// errors.
    ///
    /// # Errors
    ///
    /// `MetadataParse` if the value or one of its tables is not an object.
    pub fn from_value(value: &Value, label: &Path) -> Result<Self> {
        let Value::Object(root) = value else {
            return Err(crate::err!(MetadataParse {
                path: label.to_path_buf(),
                message: format!("expected a JSON object, found {}", json_kind(value)),
            }));
        };

        let mut issues = Vec::new();
        let resources = read_table(root, RESOURCES_KEY, label, &mut issues)?;
        let datasources = read_table(root, DATASOURCES_KEY, label, &mut issues)?;

        let warnings = issues
            .iter()
            .map(|issue| issue.to_diagnostic(SHAPE_WARNING))
            .collect::<Vec<Diagnostic>>()
            .into();

        Ok(Self {
            resources,
            datasources,
            warnings,
        })
    }

    /// Every schema record of `type_name` describing `attribute`, in
    /// document order.
    pub fn lookup<'a>(
        &'a self,
        table: SchemaTable,
        type_name: &str,
        attribute: &'a str,
    ) -> impl Iterator<Item = &'a AttributeSchema> + 'a {
        let map = match table {
            SchemaTable::Resources => &self.resources,
            SchemaTable::Datasources => &self.datasources,
        };
        map.get(type_name)
            .into_iter()
            .flatten()
            .filter(move |schema| schema.name == attribute)
    }

    /// Warnings for fields and records dropped while reading the document.
    #[must_use]
    pub fn warnings(&self) -> &Diagnostics {
        &self.warnings
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.datasources.is_empty()
    }

    /// Number of resource types and data source types described.
    #[must_use]
    pub fn type_count(&self) -> (usize, usize) {
        (self.resources.len(), self.datasources.len())
    }
}

impl FromStr for ProviderMetadata {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self> {
        let label = PathBuf::from("<inline>");
        let value: Value = serde_json::from_str(s).map_err(|e| {
            crate::err!(MetadataParse {
                path: label.clone(),
                message: e.to_string(),
            })
        })?;
        Self::from_value(&value, &label)
    }
}

fn read_table(
    root: &Map<String, Value>,
    key: &str,
    label: &Path,
    issues: &mut Vec<InspectError>,
) -> Result<HashMap<String, Vec<AttributeSchema>>> {
    let mut table = HashMap::new();
    let Some(value) = root.get(key).filter(|v| !v.is_null()) else {
        return Ok(table);
    };
    let Value::Object(types) = value else {
        return Err(crate::err!(MetadataParse {
            path: label.to_path_buf(),
            message: format!("'{key}' must be an object, found {}", json_kind(value)),
        }));
    };

    for (type_name, records) in types {
        let Value::Array(records) = records else {
            issues.push(crate::err!(MetadataShape {
                record: type_name.clone(),
                field: key.to_string(),
                expected: "array",
                found: json_kind(records),
            }));
            continue;
        };

        let mut schemas = Vec::with_capacity(records.len());
        for record in records {
            match record {
                Value::Object(fields) => {
                    if let Some(schema) = AttributeSchema::from_record(type_name, fields, issues) {
                        schemas.push(schema);
                    }
                }
                other => issues.push(crate::err!(MetadataShape {
                    record: type_name.clone(),
                    field: "[]".to_string(),
                    expected: "object",
                    found: json_kind(other),
                })),
            }
        }
        table.insert(type_name.clone(), schemas);
    }
    Ok(table)
}
