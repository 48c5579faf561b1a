//! Plain text report generator.

use crate::config::Config;
use crate::diagnostics::{Diagnostics, Severity};
use crate::error::Result;
use crate::ordered::sorted_keys;
use crate::reporter::ReportGenerator;
use crate::resolver::{Inspection, SourceAddress};
use crate::types::{Module, Resource};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use std::collections::HashMap;

/// Text report generator for CLI output.
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
    variables_only: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
            variables_only: false,
        }
    }

    #[must_use]
    pub fn variables_only(mut self, enabled: bool) -> Self {
        self.variables_only = enabled;
        self
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, inspection: &Inspection) -> Result<String> {
        let mut output = String::new();

        let Some(module) = &inspection.module else {
            output.push_str(&self.format_header("(no module)"));
            output.push_str(&self.format_diagnostics(&inspection.diagnostics));
            return Ok(output);
        };

        output.push_str(&self.format_header(&module.path));

        if !self.variables_only && !module.required_providers.is_empty() {
            output.push_str(&self.format_providers(module));
        }
        if !module.variables.is_empty() {
            output.push_str(&self.format_variables(module));
        }
        if !module.outputs.is_empty() {
            output.push_str(&self.format_outputs(module));
        }
        if !self.variables_only {
            if !module.managed_resources.is_empty() {
                output.push_str(&self.format_resources("Managed Resources", &module.managed_resources));
            }
            if !module.data_resources.is_empty() {
                output.push_str(&self.format_resources("Data Resources", &module.data_resources));
            }
            if !module.module_calls.is_empty() {
                output.push_str(&self.format_module_calls(module));
            }
        }
        if !inspection.diagnostics.is_empty() {
            output.push_str(&self.format_diagnostics(&inspection.diagnostics));
        }

        output.push_str(&self.format_footer(module, &inspection.diagnostics));
        Ok(output)
    }
}

impl TextReporter {
    fn format_header(&self, path: &str) -> String {
        let title = "Module";
        let version = format!("tfinspect v{}", env!("CARGO_PKG_VERSION"));

        if self.use_colors {
            format!(
                "\n{} {} {}\n{}\n",
                title.bright_white().bold(),
                path.bright_white(),
                version.dimmed(),
                "=".repeat(80).bright_blue(),
            )
        } else {
            format!("\n{title} {path} {version}\n{}\n", "=".repeat(80))
        }
    }

    fn section(&self, title: &str) -> String {
        let title = if self.use_colors {
            title.bright_cyan().bold().to_string()
        } else {
            title.to_string()
        };
        format!("\n{title}\n{}\n", "-".repeat(80))
    }

    fn table(header: Vec<&str>) -> Table {
        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header);
        table
    }

    fn flag(&self, value: Option<bool>) -> Cell {
        match value {
            Some(true) if self.use_colors => Cell::new("yes").fg(Color::Yellow),
            Some(true) => Cell::new("yes"),
            Some(false) => Cell::new("no"),
            None => Cell::new(""),
        }
    }

    fn format_providers(&self, module: &Module) -> String {
        let mut table = Self::table(vec!["Provider", "Source", "Version"]);
        for name in sorted_keys(&module.required_providers) {
            let requirement = &module.required_providers[&name];
            table.add_row(vec![
                Cell::new(&name),
                Cell::new(&requirement.source),
                Cell::new(requirement.version_constraints.join(", ")),
            ]);
        }
        format!("{}{table}\n", self.section("Required Providers"))
    }

    fn format_variables(&self, module: &Module) -> String {
        let header = if self.variables_only {
            vec!["Name", "Type", "Required", "Sensitive", "Cloud Data Type", "Description"]
        } else {
            vec!["Name", "Type", "Required", "Sensitive", "Cloud Data Type", "Source"]
        };
        let mut table = Self::table(header);
        for name in sorted_keys(&module.variables) {
            let variable = &module.variables[&name];
            let last = if self.variables_only {
                truncate(&variable.description, 60)
            } else {
                variable.source.join("\n")
            };
            table.add_row(vec![
                Cell::new(&name),
                Cell::new(&variable.type_name),
                self.flag(variable.required),
                self.flag(variable.sensitive),
                Cell::new(&variable.cloud_data_type),
                Cell::new(last),
            ]);
        }
        format!("{}{table}\n", self.section("Variables"))
    }

    fn format_outputs(&self, module: &Module) -> String {
        let mut table = Self::table(vec!["Name", "Value", "Cloud Data Type", "Source"]);
        for name in sorted_keys(&module.outputs) {
            let output = &module.outputs[&name];
            let source = if self.variables_only {
                String::new()
            } else {
                output.source.join("\n")
            };
            table.add_row(vec![
                Cell::new(&name),
                Cell::new(truncate(&output.value, 60)),
                Cell::new(&output.cloud_data_type),
                Cell::new(source),
            ]);
        }
        format!("{}{table}\n", self.section("Outputs"))
    }

    fn format_resources(&self, title: &str, resources: &HashMap<String, Resource>) -> String {
        let mut table = Self::table(vec!["Address", "Provider", "Variables", "Location"]);
        for address in sorted_keys(resources) {
            let resource = &resources[&address];
            let provider = if resource.provider.alias.is_empty() {
                resource.provider.name.clone()
            } else {
                format!("{}.{}", resource.provider.name, resource.provider.alias)
            };
            let bound: Vec<String> = sorted_keys(&resource.attributes)
                .into_iter()
                .filter_map(|attr| {
                    resource.attributes[&attr]
                        .variable_name()
                        .map(|var| format!("{attr} = var.{var}"))
                })
                .collect();
            table.add_row(vec![
                Cell::new(&address),
                Cell::new(provider),
                Cell::new(bound.join("\n")),
                Cell::new(format!("{}:{}", resource.pos.filename, resource.pos.line)),
            ]);
        }
        format!("{}{table}\n", self.section(title))
    }

    fn format_module_calls(&self, module: &Module) -> String {
        let mut table = Self::table(vec!["Name", "Source", "Kind", "Version", "Resources"]);
        for name in sorted_keys(&module.module_calls) {
            let call = &module.module_calls[&name];
            let address = SourceAddress::parse(&call.source);
            let resources = call.managed_resources.len() + call.data_resources.len();
            table.add_row(vec![
                Cell::new(&name),
                Cell::new(truncate(&call.source, 60)),
                Cell::new(address.kind.label()),
                Cell::new(&call.version),
                Cell::new(resources),
            ]);
        }
        format!("{}{table}\n", self.section("Module Calls"))
    }

    fn format_diagnostics(&self, diagnostics: &Diagnostics) -> String {
        let mut table = Self::table(vec!["Severity", "Summary", "Detail"]);
        for diagnostic in diagnostics {
            let severity = match (diagnostic.severity, self.use_colors) {
                (Severity::Error, true) => Cell::new("ERROR").fg(Color::Red),
                (Severity::Warning, true) => Cell::new("WARNING").fg(Color::Yellow),
                (severity, false) => Cell::new(severity),
            };
            table.add_row(vec![
                severity,
                Cell::new(&diagnostic.summary),
                Cell::new(&diagnostic.detail),
            ]);
        }
        format!("{}{table}\n", self.section("Diagnostics"))
    }

    fn format_footer(&self, module: &Module, diagnostics: &Diagnostics) -> String {
        let errors = diagnostics.error_count();
        let warnings = diagnostics.len() - errors;
        let counts = format!(
            "{} variables | {} outputs | {} resources | {} module calls",
            module.variables.len(),
            module.outputs.len(),
            module.resource_count(),
            module.module_calls.len()
        );

        if self.use_colors {
            let status = if errors > 0 {
                format!("{errors} errors, {warnings} warnings").red().bold()
            } else if warnings > 0 {
                format!("{warnings} warnings").yellow()
            } else {
                "no problems".green()
            };
            format!("\n{counts}\n{status}\n")
        } else if errors > 0 {
            format!("\n{counts}\n{errors} errors, {warnings} warnings\n")
        } else if warnings > 0 {
            format!("\n{counts}\n{warnings} warnings\n")
        } else {
            format!("\n{counts}\nno problems\n")
        }
    }
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::types::{ModuleCall, Output, Variable};

    fn config() -> Config {
        let mut config = Config::default();
        config.output.colored = false;
        config
    }

    fn inspection() -> Inspection {
        let mut module = Module::new("root");
        let mut variable = Variable::new("rg_id");
        variable.type_name = "string".to_string();
        variable.required = Some(true);
        variable.description = "Resource group".to_string();
        variable.source = vec!["ibm_is_vpc.main.resource_group".to_string()];
        module.variables.insert("rg_id".to_string(), variable);
        let mut output = Output::new("vpc_id");
        output.value = "ibm_is_vpc.main.id".to_string();
        module.outputs.insert("vpc_id".to_string(), output);
        module.module_calls.insert(
            "db".to_string(),
            ModuleCall {
                name: "db".to_string(),
                source: "git::https://example.com/db.git?ref=v1".to_string(),
                ..ModuleCall::default()
            },
        );
        module
            .diagnostics
            .push(Diagnostic::error("module path error", "module source x"));

        Inspection {
            diagnostics: module.diagnostics.clone(),
            module: Some(module),
        }
    }

    #[test]
    fn test_text_report_generation() {
        let text = TextReporter::new(&config()).generate(&inspection()).unwrap();

        assert!(text.contains("Variables"));
        assert!(text.contains("rg_id"));
        assert!(text.contains("ibm_is_vpc.main.resource_group"));
        assert!(text.contains("Module Calls"));
        assert!(text.contains("git"));
        assert!(text.contains("module path error"));
        assert!(text.contains("1 errors, 0 warnings"));
    }

    #[test]
    fn test_text_variables_only() {
        let text = TextReporter::new(&config())
            .variables_only(true)
            .generate(&inspection())
            .unwrap();

        assert!(text.contains("Resource group"));
        assert!(!text.contains("ibm_is_vpc.main.resource_group"));
        assert!(!text.contains("Module Calls"));
    }

    #[test]
    fn test_text_without_module() {
        let failed = Inspection {
            module: None,
            diagnostics: vec![Diagnostic::error("initDirErr", "run terraform init")].into(),
        };
        let text = TextReporter::new(&config()).generate(&failed).unwrap();
        assert!(text.contains("initDirErr"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }
}
