//! Report generation module.
//!
//! This module renders an [`Inspection`] in two formats:
//! - JSON: the module model, keys in deterministic order
//! - Text: human-readable tables for the terminal
//!
//! Both can be restricted to the variables-only view (`--filter-variables`),
//! which keeps variables and outputs and strips their `source` and `pos`.
//!
//! # Example
//!
//! ```rust,no_run
//! use tfinspect::reporter::Reporter;
//! use tfinspect::types::ReportFormat;
//! use tfinspect::{Config, Inspector};
//! use std::path::Path;
//!
//! let config = Config::default();
//! let inspection = Inspector::new(config.clone())
//!     .inspect(Path::new("."), None)
//!     .unwrap();
//! let report = Reporter::new(&config).generate(&inspection, ReportFormat::Json).unwrap();
//! println!("{report}");
//! ```

mod json;
mod text;

use crate::config::Config;
use crate::error::Result;
use crate::resolver::Inspection;
use crate::types::{Module, Output, ReportFormat, Variable};
use serde::Serialize;
use std::collections::BTreeMap;

pub use json::JsonReporter;
pub use text::TextReporter;

/// Report generator that supports multiple output formats.
pub struct Reporter {
    config: Config,
    variables_only: bool,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            variables_only: false,
        }
    }

    /// Render only variables and outputs, without provenance.
    #[must_use]
    pub fn variables_only(mut self, enabled: bool) -> Self {
        self.variables_only = enabled;
        self
    }

    /// Generate a report in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn generate(&self, inspection: &Inspection, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => JsonReporter::new(&self.config)
                .variables_only(self.variables_only)
                .generate(inspection),
            ReportFormat::Text => TextReporter::new(&self.config)
                .variables_only(self.variables_only)
                .generate(inspection),
        }
    }
}

/// Trait for report generators.
pub trait ReportGenerator {
    /// Generate a report from an inspection.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn generate(&self, inspection: &Inspection) -> Result<String>;
}

/// Variables and outputs with `source` and `pos` stripped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariablesView {
    pub variables: BTreeMap<String, Variable>,
    pub outputs: BTreeMap<String, Output>,
}

impl From<&Module> for VariablesView {
    fn from(module: &Module) -> Self {
        let variables = module
            .variables
            .iter()
            .map(|(name, variable)| {
                let mut variable = variable.clone();
                variable.source.clear();
                variable.pos = None;
                (name.clone(), variable)
            })
            .collect();
        let outputs = module
            .outputs
            .iter()
            .map(|(name, output)| {
                let mut output = output.clone();
                output.source.clear();
                output.pos = None;
                (name.clone(), output)
            })
            .collect();
        Self { variables, outputs }
    }
}
