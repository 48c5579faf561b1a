//! Decoder for the JSON configuration syntax (`*.tf.json`).
//!
//! JSON files carry the same constructs as native files, with expressions
//! written as `"${...}"` strings. Type constraints and provider references
//! are always strings here, so both grammars accept them.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::parser::hcl::{parse_provider_string, unwrap_interpolation, variable_in_template};
use crate::parser::{declare, ConfigFile, Grammar, MODULE_META_ARGUMENTS, RESOURCE_META_ARGUMENTS};
use crate::types::{
    AttributeValue, Module, ModuleCall, Output, ProviderConfig, ProviderRef, Resource,
    ResourceMode, SourcePos, Variable,
};
use serde_json::{Map, Value};

/// Decode one JSON file into `module`.
pub(crate) fn decode_file(
    content: &str,
    file: &ConfigFile,
    grammar: Grammar,
    module: &mut Module,
    diagnostics: &mut Diagnostics,
) {
    let root: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            diagnostics.push(Diagnostic::error(
                "Failed to parse JSON configuration",
                format!("{}: {e}", file.path.display()),
            ));
            return;
        }
    };
    let Value::Object(root) = root else {
        diagnostics.push(Diagnostic::error(
            "Failed to parse JSON configuration",
            format!("{}: the root value must be an object", file.path.display()),
        ));
        return;
    };

    tracing::trace!(file = %file.path.display(), ?grammar, "Decoding JSON syntax");

    let decoder = JsonDecoder { content, file };
    for (kind, value) in &root {
        for section in objects(value) {
            match kind.as_str() {
                "variable" => decoder.variables(section, module, diagnostics),
                "output" => decoder.outputs(section, module, diagnostics),
                "resource" => decoder.resources(section, ResourceMode::Managed, module, diagnostics),
                "data" => decoder.resources(section, ResourceMode::Data, module, diagnostics),
                "module" => decoder.module_calls(section, module, diagnostics),
                "terraform" => decoder.terraform(section, module),
                "provider" => decoder.providers(section, module),
                _ => {}
            }
        }
    }
}

/// A JSON block body may be an object or an array of objects.
fn objects(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Object(map) => vec![map],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

struct JsonDecoder<'a> {
    content: &'a str,
    file: &'a ConfigFile,
}

impl JsonDecoder<'_> {
    fn pos(&self, label: &str) -> SourcePos {
        let needle = format!("\"{label}\"");
        let line = self
            .content
            .find(&needle)
            .map_or(0, |at| self.content[..at].matches('\n').count() + 1);
        SourcePos {
            filename: self.file.path.display().to_string(),
            line,
        }
    }

    fn variables(&self, section: &Map<String, Value>, module: &mut Module, diagnostics: &mut Diagnostics) {
        for (name, body) in section {
            let pos = self.pos(name);
            let mut variable = Variable::new(name.as_str());
            variable.required = Some(true);

            for body in objects(body) {
                if let Some(Value::String(t)) = body.get("type") {
                    variable.type_name = unwrap_interpolation(t);
                }
                if let Some(Value::String(d)) = body.get("description") {
                    variable.description = d.clone();
                }
                if let Some(default) = body.get("default") {
                    variable.default = Some(default.clone());
                    variable.required = Some(false);
                }
                if let Some(Value::Bool(s)) = body.get("sensitive") {
                    variable.sensitive = Some(*s);
                }
            }

            variable.pos = Some(pos.clone());
            declare(&mut module.variables, name.clone(), variable, "variable", self.file, &pos, diagnostics);
        }
    }

    fn outputs(&self, section: &Map<String, Value>, module: &mut Module, diagnostics: &mut Diagnostics) {
        for (name, body) in section {
            let pos = self.pos(name);
            let mut output = Output::new(name.as_str());
            for body in objects(body) {
                match body.get("value") {
                    Some(Value::String(v)) => output.value = unwrap_interpolation(v),
                    Some(other) => output.value = other.to_string(),
                    None => {}
                }
                if let Some(Value::String(d)) = body.get("description") {
                    output.description = d.clone();
                }
                output.sensitive = matches!(body.get("sensitive"), Some(Value::Bool(true)));
            }
            output.pos = Some(pos.clone());
            declare(&mut module.outputs, name.clone(), output, "output", self.file, &pos, diagnostics);
        }
    }

    fn resources(
        &self,
        section: &Map<String, Value>,
        mode: ResourceMode,
        module: &mut Module,
        diagnostics: &mut Diagnostics,
    ) {
        for (type_name, by_name) in section {
            for named in objects(by_name) {
                for (name, body) in named {
                    let pos = self.pos(name);
                    let mut resource = Resource {
                        mode,
                        type_name: type_name.clone(),
                        name: name.clone(),
                        provider: ProviderRef::implied_by(type_name),
                        pos: pos.clone(),
                        ..Resource::default()
                    };
                    for body in objects(body) {
                        for (key, value) in body {
                            if key == "provider" {
                                if let Value::String(p) = value {
                                    resource.provider = parse_provider_string(&unwrap_interpolation(p));
                                }
                            } else if !RESOURCE_META_ARGUMENTS.contains(&key.as_str()) {
                                resource.attributes.insert(key.clone(), classify(value));
                            }
                        }
                    }

                    let (map, kind) = match mode {
                        ResourceMode::Managed => (&mut module.managed_resources, "resource"),
                        ResourceMode::Data => (&mut module.data_resources, "data source"),
                    };
                    declare(map, resource.address(), resource, kind, self.file, &pos, diagnostics);
                }
            }
        }
    }

    fn module_calls(&self, section: &Map<String, Value>, module: &mut Module, diagnostics: &mut Diagnostics) {
        for (name, body) in section {
            let pos = self.pos(name);
            let mut call = ModuleCall {
                name: name.clone(),
                pos: pos.clone(),
                ..ModuleCall::default()
            };
            for body in objects(body) {
                for (key, value) in body {
                    match (key.as_str(), value) {
                        ("source", Value::String(s)) => call.source = s.clone(),
                        ("version", Value::String(v)) => call.version = v.clone(),
                        (k, _) if MODULE_META_ARGUMENTS.contains(&k) => {}
                        _ => {
                            call.attributes.insert(key.clone(), classify(value));
                        }
                    }
                }
            }

            if call.source.is_empty() && !self.file.is_override {
                diagnostics.push(Diagnostic::error(
                    "Missing required argument",
                    format!(
                        "The module \"{name}\" has no source argument; {}:{}",
                        pos.filename, pos.line
                    ),
                ));
                continue;
            }
            declare(&mut module.module_calls, name.clone(), call, "module call", self.file, &pos, diagnostics);
        }
    }

    fn terraform(&self, section: &Map<String, Value>, module: &mut Module) {
        if let Some(Value::String(version)) = section.get("required_version") {
            module.required_core.push(version.clone());
        }
        for providers in section.get("required_providers").map(objects).unwrap_or_default() {
            for (name, requirement) in providers {
                let entry = module.required_providers.entry(name.clone()).or_default();
                match requirement {
                    Value::String(version) => entry.version_constraints.push(version.clone()),
                    Value::Object(fields) => {
                        if let Some(Value::String(source)) = fields.get("source") {
                            entry.source = source.clone();
                        }
                        if let Some(Value::String(version)) = fields.get("version") {
                            entry.version_constraints.push(version.clone());
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn providers(&self, section: &Map<String, Value>, module: &mut Module) {
        for (name, configs) in section {
            for config in objects(configs) {
                let alias = config
                    .get("alias")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let key = if alias.is_empty() {
                    name.clone()
                } else {
                    format!("{name}.{alias}")
                };
                module.provider_configs.insert(
                    key,
                    ProviderConfig {
                        name: name.clone(),
                        alias,
                    },
                );
            }
        }
    }
}

fn classify(value: &Value) -> AttributeValue {
    match value {
        Value::String(s) if s.contains("${") => match variable_in_template(s) {
            Some(name) => AttributeValue::Variable(name),
            None => AttributeValue::Expression(unwrap_interpolation(s)),
        },
        other => AttributeValue::Literal(other.clone()),
    }
}
