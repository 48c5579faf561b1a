//! JSON report generator.

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::reporter::{ReportGenerator, VariablesView};
use crate::resolver::Inspection;
use crate::types::Module;
use serde::Serialize;

/// JSON report generator.
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
    variables_only: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
            variables_only: false,
        }
    }

    #[must_use]
    pub fn variables_only(mut self, enabled: bool) -> Self {
        self.variables_only = enabled;
        self
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(&self, inspection: &Inspection) -> Result<String> {
        let report = match &inspection.module {
            Some(module) if self.variables_only => JsonReport::Variables(VariablesView::from(module)),
            Some(module) => JsonReport::Module(module),
            None => JsonReport::Failed {
                diagnostics: &inspection.diagnostics,
            },
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };

        json.map_err(|e| {
            crate::err!(ReportGeneration {
                message: format!("Failed to serialize JSON report: {e}"),
            })
        })
    }
}

/// Top-level JSON document.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum JsonReport<'a> {
    Module(&'a Module),
    Variables(VariablesView),
    /// No module could be produced
    Failed { diagnostics: &'a Diagnostics },
}
