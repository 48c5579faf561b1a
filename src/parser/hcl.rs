//! HCL front ends built on the `hcl-rs` crate.
//!
//! Both front ends share one decoder; the [`Grammar`] switch only changes how
//! strict it is about HCL1-era constructs.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::fs::FileSystem;
use crate::parser::{
    declare, dir_files, json, ConfigFile, FrontEnd, MODULE_META_ARGUMENTS,
    RESOURCE_META_ARGUMENTS,
};
use crate::types::{
    AttributeValue, Module, ModuleCall, Output, ProviderConfig, ProviderRef,
    ProviderRequirement, Resource, ResourceMode, SourcePos, Variable,
};

use hcl::{Block, Body, Expression, ObjectKey, TraversalOperator};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

// `"${var.name}"` with nothing else in the template
static VARIABLE_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\{\s*var\.([A-Za-z_][A-Za-z0-9_-]*)\s*\}$").expect("Invalid regex")
});

// A template that is exactly one interpolation
static SINGLE_INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{\s*([^{}]*?)\s*\}$").expect("Invalid regex"));

/// Which configuration grammar the decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Current grammar: type constraints and provider references are bare
    /// expressions.
    Modern,
    /// HCL1-era grammar: quoted type constraints (`"string"`, `"list"`,
    /// `"map"`) and quoted provider references (`"aws.west"`) are accepted.
    Legacy,
}

/// Front end for the current configuration grammar.
#[derive(Debug, Clone, Default)]
pub struct HclFrontEnd {
    exclude_patterns: Vec<String>,
}

impl HclFrontEnd {
    #[must_use]
    pub fn new(exclude_patterns: Vec<String>) -> Self {
        Self { exclude_patterns }
    }
}

impl FrontEnd for HclFrontEnd {
    fn name(&self) -> &'static str {
        "hcl"
    }

    fn load(&self, fs: &dyn FileSystem, dir: &Path) -> (Module, Diagnostics) {
        load_directory(fs, dir, &self.exclude_patterns, Grammar::Modern)
    }
}

/// Front end for the legacy (HCL1-era) configuration grammar.
#[derive(Debug, Clone, Default)]
pub struct LegacyHclFrontEnd {
    exclude_patterns: Vec<String>,
}

impl LegacyHclFrontEnd {
    #[must_use]
    pub fn new(exclude_patterns: Vec<String>) -> Self {
        Self { exclude_patterns }
    }
}

impl FrontEnd for LegacyHclFrontEnd {
    fn name(&self) -> &'static str {
        "legacy-hcl"
    }

    fn load(&self, fs: &dyn FileSystem, dir: &Path) -> (Module, Diagnostics) {
        load_directory(fs, dir, &self.exclude_patterns, Grammar::Legacy)
    }
}

fn load_directory(
    fs: &dyn FileSystem,
    dir: &Path,
    exclude_patterns: &[String],
    grammar: Grammar,
) -> (Module, Diagnostics) {
    let mut module = Module::new(dir.display().to_string());
    let mut diagnostics = Diagnostics::new();

    let files = match dir_files(fs, dir, exclude_patterns) {
        Ok(files) => files,
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            return (module, diagnostics);
        }
    };

    for file in &files {
        let content = match fs.read_to_string(&file.path) {
            Ok(content) => content,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to read file",
                    format!("The configuration file {} could not be read: {e}", file.path.display()),
                ));
                continue;
            }
        };

        tracing::debug!(file = %file.path.display(), ?grammar, "Parsing file");

        if file.is_json {
            json::decode_file(&content, file, grammar, &mut module, &mut diagnostics);
        } else {
            decode_file(&content, file, grammar, &mut module, &mut diagnostics);
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        files = files.len(),
        variables = module.variables.len(),
        resources = module.resource_count(),
        module_calls = module.module_calls.len(),
        errors = diagnostics.error_count(),
        "Loaded directory"
    );

    (module, diagnostics)
}

/// Decode one native-syntax file into `module`.
fn decode_file(
    content: &str,
    file: &ConfigFile,
    grammar: Grammar,
    module: &mut Module,
    diagnostics: &mut Diagnostics,
) {
    let body: Body = match hcl::from_str(content) {
        Ok(body) => body,
        Err(e) => {
            diagnostics.push(Diagnostic::error(
                "Failed to parse HCL",
                format!("{}: {e}", file.path.display()),
            ));
            return;
        }
    };

    let decoder = Decoder {
        content,
        file,
        grammar,
    };

    for block in body.blocks() {
        match block.identifier.as_str() {
            "variable" => decoder.variable(block, module, diagnostics),
            "output" => decoder.output(block, module, diagnostics),
            "resource" => decoder.resource(block, ResourceMode::Managed, module, diagnostics),
            "data" => decoder.resource(block, ResourceMode::Data, module, diagnostics),
            "module" => decoder.module_call(block, module, diagnostics),
            "terraform" => decoder.terraform(block, module, diagnostics),
            "provider" => decoder.provider(block, module),
            _ => {
                // locals, moved, import, check, ...
            }
        }
    }
}

struct Decoder<'a> {
    content: &'a str,
    file: &'a ConfigFile,
    grammar: Grammar,
}

impl Decoder<'_> {
    fn pos(&self, block: &Block) -> SourcePos {
        let labels: Vec<&str> = block.labels.iter().map(|l| l.as_str()).collect();
        SourcePos {
            filename: self.file.path.display().to_string(),
            line: block_line(self.content, block.identifier.as_str(), &labels),
        }
    }

    fn error(&self, diagnostics: &mut Diagnostics, summary: &str, pos: &SourcePos, detail: String) {
        diagnostics.push(Diagnostic::error(
            summary,
            format!("{detail}; {}:{}", pos.filename, pos.line),
        ));
    }

    /// Block labels, or an error diagnostic when there are not exactly `count`.
    fn labels<'b>(
        &self,
        block: &'b Block,
        count: usize,
        diagnostics: &mut Diagnostics,
    ) -> Option<Vec<&'b str>> {
        let labels: Vec<&str> = block.labels.iter().map(|l| l.as_str()).collect();
        if labels.len() == count {
            Some(labels)
        } else {
            let pos = self.pos(block);
            self.error(
                diagnostics,
                "Invalid block labels",
                &pos,
                format!(
                    "A {} block requires {count} label(s), found {}",
                    block.identifier.as_str(),
                    labels.len()
                ),
            );
            None
        }
    }

    fn variable(&self, block: &Block, module: &mut Module, diagnostics: &mut Diagnostics) {
        let Some(labels) = self.labels(block, 1, diagnostics) else {
            return;
        };
        let pos = self.pos(block);
        let mut variable = Variable::new(labels[0]);
        variable.required = Some(true);

        for attr in block.body.attributes() {
            match attr.key.as_str() {
                "type" => match self.type_constraint(&attr.expr) {
                    Ok(type_name) => variable.type_name = type_name,
                    Err(detail) => {
                        self.error(diagnostics, "Invalid type specification", &pos, detail);
                    }
                },
                "description" => variable.description = string_value(&attr.expr),
                "default" => {
                    variable.default = literal_json(&attr.expr);
                    variable.required = Some(false);
                }
                "sensitive" => {
                    if let Expression::Bool(b) = &attr.expr {
                        variable.sensitive = Some(*b);
                    }
                }
                _ => {}
            }
        }

        variable.pos = Some(pos.clone());
        declare(
            &mut module.variables,
            variable.name.clone(),
            variable,
            "variable",
            self.file,
            &pos,
            diagnostics,
        );
    }

    fn output(&self, block: &Block, module: &mut Module, diagnostics: &mut Diagnostics) {
        let Some(labels) = self.labels(block, 1, diagnostics) else {
            return;
        };
        let pos = self.pos(block);
        let mut output = Output::new(labels[0]);

        for attr in block.body.attributes() {
            match attr.key.as_str() {
                "value" => output.value = expression_text(&attr.expr),
                "description" => output.description = string_value(&attr.expr),
                "sensitive" => output.sensitive = matches!(attr.expr, Expression::Bool(true)),
                _ => {}
            }
        }

        output.pos = Some(pos.clone());
        declare(
            &mut module.outputs,
            output.name.clone(),
            output,
            "output",
            self.file,
            &pos,
            diagnostics,
        );
    }

    fn resource(
        &self,
        block: &Block,
        mode: ResourceMode,
        module: &mut Module,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(labels) = self.labels(block, 2, diagnostics) else {
            return;
        };
        let pos = self.pos(block);
        let mut resource = Resource {
            mode,
            type_name: labels[0].to_string(),
            name: labels[1].to_string(),
            provider: ProviderRef::implied_by(labels[0]),
            attributes: HashMap::new(),
            pos: pos.clone(),
        };

        for attr in block.body.attributes() {
            let key = attr.key.as_str();
            if key == "provider" {
                match self.provider_ref(&attr.expr) {
                    Ok(provider) => resource.provider = provider,
                    Err(detail) => {
                        self.error(diagnostics, "Invalid provider reference", &pos, detail);
                    }
                }
            } else if !RESOURCE_META_ARGUMENTS.contains(&key) {
                resource
                    .attributes
                    .insert(key.to_string(), classify(&attr.expr));
            }
        }

        let (map, kind) = match mode {
            ResourceMode::Managed => (&mut module.managed_resources, "resource"),
            ResourceMode::Data => (&mut module.data_resources, "data source"),
        };
        declare(map, resource.address(), resource, kind, self.file, &pos, diagnostics);
    }

    fn module_call(&self, block: &Block, module: &mut Module, diagnostics: &mut Diagnostics) {
        let Some(labels) = self.labels(block, 1, diagnostics) else {
            return;
        };
        let pos = self.pos(block);
        let mut call = ModuleCall {
            name: labels[0].to_string(),
            pos: pos.clone(),
            ..ModuleCall::default()
        };

        let mut has_source = false;
        for attr in block.body.attributes() {
            let key = attr.key.as_str();
            match key {
                "source" => {
                    call.source = string_value(&attr.expr);
                    has_source = true;
                }
                "version" => call.version = string_value(&attr.expr),
                _ if MODULE_META_ARGUMENTS.contains(&key) => {}
                _ => {
                    call.attributes.insert(key.to_string(), classify(&attr.expr));
                }
            }
        }

        if !has_source && !self.file.is_override {
            self.error(
                diagnostics,
                "Missing required argument",
                &pos,
                format!("The module \"{}\" has no source argument", call.name),
            );
            return;
        }

        declare(
            &mut module.module_calls,
            call.name.clone(),
            call,
            "module call",
            self.file,
            &pos,
            diagnostics,
        );
    }

    fn terraform(&self, block: &Block, module: &mut Module, diagnostics: &mut Diagnostics) {
        for attr in block.body.attributes() {
            if attr.key.as_str() == "required_version" {
                let constraint = string_value(&attr.expr);
                if !constraint.is_empty() {
                    module.required_core.push(constraint);
                }
            }
        }

        for nested in block.body.blocks() {
            if nested.identifier.as_str() != "required_providers" {
                continue;
            }
            for attr in nested.body.attributes() {
                let requirement = module
                    .required_providers
                    .entry(attr.key.as_str().to_string())
                    .or_default();
                if let Err(detail) = merge_requirement(requirement, &attr.expr) {
                    let pos = self.pos(nested);
                    self.error(diagnostics, "Invalid required_providers entry", &pos, detail);
                }
            }
        }
    }

    fn provider(&self, block: &Block, module: &mut Module) {
        let Some(name) = block.labels.first().map(|l| l.as_str().to_string()) else {
            return;
        };
        let alias = block
            .body
            .attributes()
            .find(|a| a.key.as_str() == "alias")
            .map(|a| string_value(&a.expr))
            .unwrap_or_default();
        let key = if alias.is_empty() {
            name.clone()
        } else {
            format!("{name}.{alias}")
        };
        module.provider_configs.insert(key, ProviderConfig { name, alias });
    }

    fn type_constraint(&self, expr: &Expression) -> std::result::Result<String, String> {
        match expr {
            Expression::String(quoted) => match self.grammar {
                Grammar::Legacy => Ok(quoted.clone()),
                Grammar::Modern => Err(format!(
                    "Quoted type constraints are not supported; write {quoted} instead of \"{quoted}\""
                )),
            },
            Expression::Variable(keyword) => Ok(keyword.as_str().to_string()),
            other => Ok(other.to_string()),
        }
    }

    fn provider_ref(&self, expr: &Expression) -> std::result::Result<ProviderRef, String> {
        match expr {
            Expression::Variable(name) => Ok(ProviderRef {
                name: name.as_str().to_string(),
                alias: String::new(),
            }),
            Expression::Traversal(traversal) => match (&traversal.expr, traversal.operators.as_slice()) {
                (Expression::Variable(name), [TraversalOperator::GetAttr(alias)]) => Ok(ProviderRef {
                    name: name.as_str().to_string(),
                    alias: alias.as_str().to_string(),
                }),
                _ => Err(format!("{expr} is not a provider reference")),
            },
            Expression::String(quoted) => match self.grammar {
                Grammar::Legacy => Ok(parse_provider_string(quoted)),
                Grammar::Modern => Err(format!(
                    "Quoted provider references are not supported; write {quoted} instead of \"{quoted}\""
                )),
            },
            _ => Err(format!("{expr} is not a provider reference")),
        }
    }
}

/// `"aws.west"` → name `aws`, alias `west`.
pub(crate) fn parse_provider_string(value: &str) -> ProviderRef {
    match value.split_once('.') {
        Some((name, alias)) => ProviderRef {
            name: name.to_string(),
            alias: alias.to_string(),
        },
        None => ProviderRef {
            name: value.to_string(),
            alias: String::new(),
        },
    }
}

fn merge_requirement(
    requirement: &mut ProviderRequirement,
    expr: &Expression,
) -> std::result::Result<(), String> {
    match expr {
        // pre-0.13 form: `ibm = ">= 1.0"`
        Expression::String(version) => {
            requirement.version_constraints.push(version.clone());
            Ok(())
        }
        Expression::Object(object) => {
            for (key, value) in object {
                match object_key(key).as_str() {
                    "source" => requirement.source = string_value(value),
                    "version" => {
                        let version = string_value(value);
                        if !version.is_empty() {
                            requirement.version_constraints.push(version);
                        }
                    }
                    _ => {
                        // configuration_aliases
                    }
                }
            }
            Ok(())
        }
        other => Err(format!("expected a string or object, found {other}")),
    }
}

fn object_key(key: &ObjectKey) -> String {
    match key {
        ObjectKey::Identifier(id) => id.as_str().to_string(),
        ObjectKey::Expression(expr) => string_value(expr),
        _ => String::new(),
    }
}

/// String content of a literal or template expression, empty otherwise.
fn string_value(expr: &Expression) -> String {
    match expr {
        Expression::String(s) => s.clone(),
        Expression::TemplateExpr(t) => t.to_string(),
        _ => String::new(),
    }
}

/// Classify an argument value.
pub(crate) fn classify(expr: &Expression) -> AttributeValue {
    if let Some(name) = variable_reference(expr) {
        return AttributeValue::Variable(name);
    }
    match literal_json(expr) {
        Some(value) if is_constant(expr) => AttributeValue::Literal(value),
        _ => AttributeValue::Expression(expression_text(expr)),
    }
}

fn variable_reference(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Traversal(traversal) => match (&traversal.expr, traversal.operators.as_slice()) {
            (Expression::Variable(root), [TraversalOperator::GetAttr(name)])
                if root.as_str() == "var" =>
            {
                Some(name.as_str().to_string())
            }
            _ => None,
        },
        Expression::TemplateExpr(template) => variable_in_template(&template.to_string()),
        Expression::Parenthesis(inner) => variable_reference(inner),
        _ => None,
    }
}

/// `"${var.name}"` → `name`.
pub(crate) fn variable_in_template(template: &str) -> Option<String> {
    VARIABLE_TEMPLATE
        .captures(template)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_constant(expr: &Expression) -> bool {
    match expr {
        Expression::Null
        | Expression::Bool(_)
        | Expression::Number(_)
        | Expression::String(_) => true,
        Expression::Array(items) => items.iter().all(is_constant),
        Expression::Object(object) => object.iter().all(|(key, value)| {
            let constant_key = match key {
                ObjectKey::Identifier(_) => true,
                ObjectKey::Expression(k) => is_constant(k),
                _ => false,
            };
            constant_key && is_constant(value)
        }),
        Expression::Parenthesis(inner) => is_constant(inner),
        _ => false,
    }
}

/// JSON form of a value: constants convert structurally, anything else
/// becomes its source text.
fn literal_json(expr: &Expression) -> Option<serde_json::Value> {
    if is_constant(expr) {
        let value = hcl::Value::from(expr.clone());
        serde_json::to_value(value).ok()
    } else {
        Some(serde_json::Value::String(expression_text(expr)))
    }
}

/// Source text of an expression, with a lone `${...}` interpolation unwrapped.
pub(crate) fn expression_text(expr: &Expression) -> String {
    match expr {
        Expression::TemplateExpr(template) => unwrap_interpolation(&template.to_string()),
        Expression::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn unwrap_interpolation(template: &str) -> String {
    SINGLE_INTERPOLATION
        .captures(template)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| template.to_string(), |m| m.as_str().to_string())
}

/// 1-based line of a block header such as `resource "a" "b" {`, or 0 when it
/// cannot be located.
fn block_line(content: &str, identifier: &str, labels: &[&str]) -> usize {
    let mut pattern = format!(r"(?m)^[ \t]*{}", regex::escape(identifier));
    for label in labels {
        pattern.push_str(&format!(r#"[ \t]+"?{}"?"#, regex::escape(label)));
    }
    pattern.push_str(r"[ \t]*\{");

    Regex::new(&pattern)
        .ok()
        .and_then(|re| re.find(content))
        .map_or(0, |m| content[..m.start()].matches('\n').count() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn decode(content: &str, grammar: Grammar) -> (Module, Diagnostics) {
        let file = ConfigFile {
            path: PathBuf::from("main.tf"),
            is_override: false,
            is_json: false,
        };
        let mut module = Module::new(".");
        let mut diagnostics = Diagnostics::new();
        decode_file(content, &file, grammar, &mut module, &mut diagnostics);
        (module, diagnostics)
    }

    #[test]
    fn test_parse_variable_block() {
        let content = r#"
variable "region" {
  type        = string
  description = "Deployment region"
  default     = "us-south"
}

variable "zones" {
  type = list(string)
}
"#;
        let (module, diagnostics) = decode(content, Grammar::Modern);
        assert!(diagnostics.is_empty());

        let region = &module.variables["region"];
        assert_eq!(region.type_name, "string");
        assert_eq!(region.description, "Deployment region");
        assert_eq!(region.default, Some(serde_json::json!("us-south")));
        assert_eq!(region.required, Some(false));
        assert_eq!(region.pos.as_ref().unwrap().line, 2);

        let zones = &module.variables["zones"];
        assert_eq!(zones.type_name, "list(string)");
        assert_eq!(zones.required, Some(true));
        assert_eq!(zones.pos.as_ref().unwrap().line, 8);
    }

    #[test]
    fn test_parse_resource_attributes() {
        let content = r#"
resource "ibm_is_vpc" "main" {
  count          = 1
  name           = "vpc"
  resource_group = var.rg_id
  tags           = "${var.tags}"
  zone           = local.zone
}

data "ibm_resource_group" "rg" {
  name = var.rg_name
}
"#;
        let (module, diagnostics) = decode(content, Grammar::Modern);
        assert!(diagnostics.is_empty());

        let vpc = &module.managed_resources["ibm_is_vpc.main"];
        assert_eq!(vpc.provider.name, "ibm");
        assert!(!vpc.attributes.contains_key("count"));
        assert_eq!(
            vpc.attributes["resource_group"],
            AttributeValue::Variable("rg_id".into())
        );
        assert_eq!(vpc.attributes["tags"], AttributeValue::Variable("tags".into()));
        assert_eq!(
            vpc.attributes["name"],
            AttributeValue::Literal(serde_json::json!("vpc"))
        );
        assert_eq!(
            vpc.attributes["zone"],
            AttributeValue::Expression("local.zone".into())
        );

        let rg = &module.data_resources["data.ibm_resource_group.rg"];
        assert_eq!(rg.mode, ResourceMode::Data);
        assert_eq!(rg.pos.line, 10);
    }

    #[test]
    fn test_parse_module_call() {
        let content = r#"
module "db" {
  source  = "terraform-ibm-modules/db"
  version = "1.2.0"
  count   = 1
  size    = var.db_size
}
"#;
        let (module, diagnostics) = decode(content, Grammar::Modern);
        assert!(diagnostics.is_empty());

        let call = &module.module_calls["db"];
        assert_eq!(call.source, "terraform-ibm-modules/db");
        assert_eq!(call.version, "1.2.0");
        assert_eq!(call.attributes.len(), 1);
        assert_eq!(call.attributes["size"], AttributeValue::Variable("db_size".into()));
    }

    #[test]
    fn test_module_without_source() {
        let (module, diagnostics) = decode("module \"x\" {\n  a = 1\n}\n", Grammar::Modern);
        assert!(module.module_calls.is_empty());
        assert_eq!(diagnostics.iter().next().unwrap().summary, "Missing required argument");
    }

    #[test]
    fn test_parse_terraform_block() {
        let content = r#"
terraform {
  required_version = ">= 1.3"
  required_providers {
    ibm = {
      source  = "IBM-Cloud/ibm"
      version = ">= 1.60.0"
    }
    random = ">= 3.0"
  }
}
"#;
        let (module, diagnostics) = decode(content, Grammar::Modern);
        assert!(diagnostics.is_empty());
        assert_eq!(module.required_core, vec![">= 1.3"]);
        assert_eq!(module.required_providers["ibm"].source, "IBM-Cloud/ibm");
        assert_eq!(
            module.required_providers["ibm"].version_constraints,
            vec![">= 1.60.0"]
        );
        assert_eq!(
            module.required_providers["random"].version_constraints,
            vec![">= 3.0"]
        );
    }

    #[test]
    fn test_parse_output_value() {
        let content = r#"
output "vpc_crn" {
  value       = ibm_is_vpc.main.crn
  description = "CRN"
}

output "rg" {
  value     = "${data.ibm_resource_group.rg.id}"
  sensitive = true
}
"#;
        let (module, _) = decode(content, Grammar::Modern);
        assert_eq!(module.outputs["vpc_crn"].value, "ibm_is_vpc.main.crn");
        assert_eq!(module.outputs["rg"].value, "data.ibm_resource_group.rg.id");
        assert!(module.outputs["rg"].sensitive);
    }

    #[test]
    fn test_quoted_type_modern_vs_legacy() {
        let content = "variable \"zones\" {\n  type = \"list\"\n}\n";

        let (_, modern) = decode(content, Grammar::Modern);
        assert!(modern.has_errors());
        assert_eq!(modern.iter().next().unwrap().summary, "Invalid type specification");

        let (module, legacy) = decode(content, Grammar::Legacy);
        assert!(legacy.is_empty());
        assert_eq!(module.variables["zones"].type_name, "list");
    }

    #[test]
    fn test_provider_reference_forms() {
        let content = r#"
resource "ibm_is_vpc" "east" {
  provider = ibm.east
}
"#;
        let (module, _) = decode(content, Grammar::Modern);
        let provider = &module.managed_resources["ibm_is_vpc.east"].provider;
        assert_eq!(provider.name, "ibm");
        assert_eq!(provider.alias, "east");

        let quoted = "resource \"ibm_is_vpc\" \"west\" {\n  provider = \"ibm.west\"\n}\n";
        let (_, modern) = decode(quoted, Grammar::Modern);
        assert!(modern.has_errors());
        let (module, legacy) = decode(quoted, Grammar::Legacy);
        assert!(!legacy.has_errors());
        assert_eq!(module.managed_resources["ibm_is_vpc.west"].provider.alias, "west");
    }

    #[test]
    fn test_provider_blocks() {
        let content = r#"
provider "ibm" {
  region = "us-south"
}

provider "ibm" {
  alias  = "east"
  region = "us-east"
}
"#;
        let (module, _) = decode(content, Grammar::Modern);
        assert_eq!(module.provider_configs.len(), 2);
        assert_eq!(module.provider_configs["ibm.east"].alias, "east");
    }

    #[test]
    fn test_parse_invalid_hcl() {
        let (_, diagnostics) = decode("this is not valid { hcl", Grammar::Modern);
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.iter().next().unwrap().summary, "Failed to parse HCL");
    }

    #[test]
    fn test_block_line_lookup() {
        let content = "\n\nresource \"a_b\" \"c\" {\n}\nmodule d {\n}\n";
        assert_eq!(block_line(content, "resource", &["a_b", "c"]), 3);
        assert_eq!(block_line(content, "module", &["d"]), 5);
        assert_eq!(block_line(content, "variable", &["x"]), 0);
    }

    #[test]
    fn test_unwrap_interpolation() {
        assert_eq!(unwrap_interpolation("${ibm_is_vpc.main.id}"), "ibm_is_vpc.main.id");
        assert_eq!(unwrap_interpolation("prefix-${var.x}"), "prefix-${var.x}");
        assert_eq!(variable_in_template("${var.rg_id}").as_deref(), Some("rg_id"));
        assert_eq!(variable_in_template("${var.a}-${var.b}"), None);
    }
}
