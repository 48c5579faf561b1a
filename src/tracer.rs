//! Attribute-to-variable provenance tracing.
//!
//! A resource attribute bound to `var.<name>` adds
//! `<type>.<name>.<attribute>` (or `data.<type>.<name>.<attribute>`) to that
//! variable's `source` list, after pulling the matching provider schema onto
//! the variable. Outputs are traced from their value expression.
//!
//! Tracing only ever appends to `source`; existing entries are kept.

use crate::config::MetadataOptions;
use crate::metadata::{apply_to_output, apply_to_variable, is_enrichable, ProviderMetadata, SchemaTable};
use crate::ordered::sorted_keys;
use crate::types::{Module, Output, Resource, Variable};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Index or splat suffixes like `[0]`, `["a"]`, `[*]`.
static INDEX_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("Invalid regex"));

/// A plain traversal: identifiers joined by dots.
static TRAVERSAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w-]*(\.[A-Za-z_*][\w-]*)+$").expect("Invalid regex"));

/// Enriches one module's variables and outputs.
pub struct Tracer<'a> {
    metadata: &'a ProviderMetadata,
    options: &'a MetadataOptions,
}

impl<'a> Tracer<'a> {
    #[must_use]
    pub fn new(metadata: &'a ProviderMetadata, options: &'a MetadataOptions) -> Self {
        Self { metadata, options }
    }

    /// Trace data sources, then managed resources.
    pub fn trace_resources(&self, module: &mut Module) {
        self.trace_table(&module.data_resources, SchemaTable::Datasources, &mut module.variables);
        self.trace_table(&module.managed_resources, SchemaTable::Resources, &mut module.variables);
    }

    fn trace_table(
        &self,
        resources: &HashMap<String, Resource>,
        table: SchemaTable,
        variables: &mut HashMap<String, Variable>,
    ) {
        for address in sorted_keys(resources) {
            let resource = &resources[&address];
            for attribute in sorted_keys(&resource.attributes) {
                let Some(name) = resource.attributes[&attribute].variable_name() else {
                    continue;
                };
                let Some(variable) = variables.get_mut(name) else {
                    tracing::trace!(%address, %attribute, variable = name, "Reference to undeclared variable");
                    continue;
                };

                if is_enrichable(&variable.type_name, &self.options.enrichable_types) {
                    for schema in self.metadata.lookup(table, &resource.type_name, &attribute) {
                        apply_to_variable(variable, schema, self.options.merge_policy);
                    }
                }
                variable.add_sources([resource.attribute_path(&attribute)]);
            }
        }
    }

    /// Trace outputs against the module's own resources and the schema tables.
    pub fn trace_outputs(&self, module: &mut Module) {
        for name in sorted_keys(&module.outputs) {
            let Some(output) = module.outputs.get_mut(&name) else {
                continue;
            };
            if output.value.is_empty() {
                continue;
            }

            if let Some(path) =
                local_reference(&output.value, &module.managed_resources, &module.data_resources)
            {
                output.add_sources([path]);
            }
            self.enrich_output(output);
        }
    }

    fn enrich_output(&self, output: &mut Output) {
        let segments: Vec<&str> = output.value.split('.').collect();
        if segments.len() < 4 {
            return;
        }
        let n = segments.len();
        let (mode, type_name, attribute) = (segments[n - 4], segments[n - 3], segments[n - 1]);

        let table = if mode == "data" {
            SchemaTable::Datasources
        } else if type_name.starts_with(self.options.output_resource_prefix.as_str()) {
            SchemaTable::Resources
        } else {
            return;
        };

        let schemas: Vec<_> = self.metadata.lookup(table, type_name, attribute).cloned().collect();
        for schema in &schemas {
            apply_to_output(output, schema, self.options.merge_policy);
        }
    }
}

/// Provenance path of a resource attribute an output value points at, if the
/// resource is declared in the same module.
fn local_reference(
    value: &str,
    managed: &HashMap<String, Resource>,
    data: &HashMap<String, Resource>,
) -> Option<String> {
    let plain = INDEX_SUFFIX.replace_all(value.trim(), "");
    if !TRAVERSAL.is_match(&plain) {
        return None;
    }
    let segments: Vec<&str> = plain.split('.').collect();

    match segments.as_slice() {
        ["data", type_name, name, attribute, ..] => {
            let address = format!("data.{type_name}.{name}");
            data.get(&address)
                .map(|resource| resource.attribute_path(attribute))
        }
        [type_name, name, attribute, ..] => {
            let address = format!("{type_name}.{name}");
            managed.get(&address)
                .map(|resource| resource.attribute_path(attribute))
        }
        _ => None,
    }
}
