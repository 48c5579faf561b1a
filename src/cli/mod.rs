//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options.
//!
//! # Commands
//!
//! - `inspect`: Load a configuration directory and print its module model
//! - `init`: Create an example configuration file
//! - `validate`: Validate a configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Front end only, current directory
//! tfinspect inspect
//!
//! # Full pipeline with provider metadata
//! tfinspect inspect ./terraform --metadata ibm-metadata.json
//!
//! # Variables-only JSON view
//! tfinspect inspect ./terraform --metadata ibm-metadata.json --filter-variables
//!
//! # Tables instead of JSON
//! tfinspect inspect ./terraform --resolve --format text
//!
//! # Initialize configuration
//! tfinspect init
//!
//! # Validate configuration
//! tfinspect validate tfinspect.yaml
//! ```

use crate::metadata::MergePolicy;
use crate::types::ReportFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// tfinspect - Terraform configuration inspector.
#[derive(Parser, Debug)]
#[command(
    name = "tfinspect",
    author,
    version,
    about = "Terraform configuration inspector",
    long_about = "tfinspect loads a Terraform configuration directory, resolves the modules it \
                  calls (including the .terraform/modules cache), traces which resource \
                  attributes each variable flows into, and overlays provider schema metadata \
                  onto variables and outputs."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TFINSPECT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect a Terraform configuration directory
    #[command(visible_alias = "i")]
    Inspect(InspectArgs),

    /// Create an example configuration file
    Init(InitArgs),

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Arguments for the inspect command.
#[derive(Args, Debug, Default)]
pub struct InspectArgs {
    /// Configuration directory
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Provider metadata JSON document; enables the full pipeline
    #[arg(short, long, value_name = "FILE")]
    pub metadata: Option<PathBuf>,

    /// Resolve module calls and trace provenance without metadata
    #[arg(short, long)]
    pub resolve: bool,

    /// Output format
    #[arg(short, long, default_value = "json", value_enum)]
    pub format: ReportFormat,

    /// Only variables and outputs, without source and position
    #[arg(long)]
    pub filter_variables: bool,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Single-line JSON
    #[arg(long)]
    pub compact: bool,

    /// Disable colors in text output
    #[arg(long)]
    pub no_color: bool,

    /// File name patterns to skip (glob patterns)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Do not retry with the legacy grammar
    #[arg(long)]
    pub no_legacy_fallback: bool,

    /// Maximum module nesting depth
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Metadata merge policy
    #[arg(long, value_enum, value_name = "POLICY")]
    pub merge_policy: Option<MergePolicy>,
}

impl InspectArgs {
    /// Whether module resolution and enrichment run.
    #[must_use]
    pub fn full_pipeline(&self) -> bool {
        self.resolve || self.metadata.is_some()
    }
}

/// Arguments for the init command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the example configuration
    #[arg(short, long, value_name = "FILE", default_value = "tfinspect.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE", default_value = "tfinspect.yaml")]
    pub config: PathBuf,
}
