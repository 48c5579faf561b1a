//! # tfinspect
//!
//! A Terraform configuration inspector.
//!
//! tfinspect loads a configuration directory into a module model, follows
//! every module call (local paths and the `.terraform/modules` cache written
//! by `terraform init`), traces which resource attributes each input variable
//! flows into, and overlays provider schema metadata onto variables and
//! outputs.
//!
//! ## Features
//!
//! - **Front end**: `.tf` and `.tf.json` files, with a legacy-grammar retry
//! - **Module resolution**: recursive, depth first, with cycle and depth guards
//! - **Provenance**: `var.x` bindings traced through nested module calls
//! - **Metadata overlay**: write-once (or overwrite) enrichment from a
//!   provider metadata document
//! - **Output formats**: deterministic JSON and terminal tables
//!
//! ## Example
//!
//! ```rust,no_run
//! use tfinspect::{Config, Inspector, ReportFormat, Reporter};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let inspector = Inspector::new(config.clone());
//!
//!     let inspection = inspector.inspect(Path::new("./terraform"), Some(Path::new("metadata.json")))?;
//!     let report = Reporter::new(&config).generate(&inspection, ReportFormat::Json)?;
//!     println!("{report}");
//!
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fs;
pub mod metadata;
pub mod ordered;
pub mod parser;
pub mod reporter;
pub mod resolver;
pub mod tracer;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{InspectError, Result};
pub use metadata::{MergePolicy, ProviderMetadata};
pub use reporter::Reporter;
pub use resolver::{Inspection, Inspector};
pub use types::{Module, ModuleCall, Output, ReportFormat, Resource, Variable};

/// Crate version, as reported by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
