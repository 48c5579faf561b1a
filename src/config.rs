//! Configuration module for tfinspect.
//!
//! This module handles loading and validating configuration from:
//! - YAML configuration files (`tfinspect.yaml`)
//! - Environment variables
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # tfinspect.yaml
//!
//! # Front end options
//! load:
//!   exclude_patterns:
//!     - "generated_*.tf"
//!   legacy_fallback: true
//!
//! # Module resolution options
//! resolve:
//!   max_depth: 32
//!   init_dir: .terraform
//!   modules_dir: modules
//!
//! # Metadata overlay options
//! metadata:
//!   merge_policy: write_once   # or overwrite
//!   enrichable_types: [string, number, bool, "list(string)", "set(string)", map]
//!   output_resource_prefix: ibm_
//!
//! # Output options
//! output:
//!   pretty: true
//!   colored: true
//! ```

use crate::error::{InspectError, Result};
use crate::metadata::MergePolicy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "TFINSPECT_CONFIG";

/// File names searched in the working directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["tfinspect.yaml", "tfinspect.yml", ".tfinspect.yaml"];

static BRACED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid regex"));

static BARE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"));

/// Front end options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// File names to skip (glob patterns).
    pub exclude_patterns: Vec<String>,

    /// Retry with the legacy grammar when the modern one reports errors.
    pub legacy_fallback: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            legacy_fallback: true,
        }
    }
}

/// Module resolution options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Maximum module nesting depth.
    pub max_depth: usize,

    /// Directory created by `terraform init`, relative to the root module.
    pub init_dir: String,

    /// Module cache directory inside `init_dir`.
    pub modules_dir: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            init_dir: ".terraform".to_string(),
            modules_dir: "modules".to_string(),
        }
    }
}

impl ResolveOptions {
    /// `<root>/<init_dir>`
    #[must_use]
    pub fn init_path(&self, root: &Path) -> PathBuf {
        root.join(&self.init_dir)
    }

    /// `<root>/<init_dir>/<modules_dir>`
    #[must_use]
    pub fn cache_path(&self, root: &Path) -> PathBuf {
        self.init_path(root).join(&self.modules_dir)
    }
}

/// Metadata overlay options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataOptions {
    /// Precedence between declared and incoming values.
    pub merge_policy: MergePolicy,

    /// Declared variable types that may receive metadata.
    pub enrichable_types: Vec<String>,

    /// Resource type prefix an output reference needs for resource-side
    /// enrichment.
    pub output_resource_prefix: String,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::WriteOnce,
            enrichable_types: default_enrichable_types(),
            output_resource_prefix: "ibm_".to_string(),
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Pretty-print JSON
    pub pretty: bool,

    /// Use colors in text output
    pub colored: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            colored: true,
        }
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Front end options
    pub load: LoadOptions,

    /// Module resolution options
    pub resolve: ResolveOptions,

    /// Metadata overlay options
    pub metadata: MetadataOptions,

    /// Output options
    pub output: OutputOptions,
}

fn default_max_depth() -> usize {
    32
}

fn default_enrichable_types() -> Vec<String> {
    ["string", "number", "bool", "list(string)", "set(string)", "map"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a value is out of range.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content);

        // An empty or comment-only document means "all defaults"
        let config: Config = if expanded.lines().all(|l| {
            let l = l.trim();
            l.is_empty() || l.starts_with('#')
        }) {
            Config::default()
        } else {
            serde_yaml::from_str(&expanded).map_err(|e| {
                crate::err!(ConfigParse {
                    message: e.to_string(),
                    source: Some(Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
                })
            })?
        };
        config.validate()?;

        tracing::debug!(
            exclude_patterns = config.load.exclude_patterns.len(),
            legacy_fallback = config.load.legacy_fallback,
            merge_policy = %config.metadata.merge_policy,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| InspectError::io(path, e, file!(), line!()))?;
        Self::from_yaml(&content)
    }

    /// Resolve the configuration to use: an explicit path (or
    /// `TFINSPECT_CONFIG`), then the first well-known file name found in the
    /// working directory, then defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a selected file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        if let Some(path) = explicit.map(Path::to_path_buf).or(from_env) {
            tracing::debug!(path = %path.display(), "Using configuration file");
            return Self::from_file(&path);
        }

        for name in CONFIG_FILE_NAMES {
            let path = Path::new(name);
            if path.is_file() {
                tracing::debug!(path = name, "Found configuration file");
                return Self::from_file(path);
            }
        }

        tracing::debug!("No configuration file, using defaults");
        Ok(Self::default())
    }

    /// Check values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` for the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.resolve.max_depth == 0 {
            return Err(crate::err!(ConfigValue {
                key: "resolve.max_depth".to_string(),
                message: "must be greater than zero".to_string(),
            }));
        }
        if self.resolve.init_dir.trim().is_empty() {
            return Err(crate::err!(ConfigValue {
                key: "resolve.init_dir".to_string(),
                message: "must not be empty".to_string(),
            }));
        }
        if let Some(bad) = self
            .load
            .exclude_patterns
            .iter()
            .find(|p| glob::Pattern::new(p).is_err())
        {
            return Err(crate::err!(ConfigValue {
                key: "load.exclude_patterns".to_string(),
                message: format!("invalid glob pattern '{bad}'"),
            }));
        }
        Ok(())
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# tfinspect configuration file

# Front end options
load:
  # Configuration file names to skip (glob patterns)
  exclude_patterns: []
  #   - "generated_*.tf"

  # Retry with the legacy (HCL1-era) grammar when the modern one fails
  legacy_fallback: true

# Module resolution options
resolve:
  # Maximum module nesting depth before a "module depth error"
  max_depth: 32

  # Directory created by `terraform init`
  init_dir: .terraform

  # Module cache inside init_dir
  modules_dir: modules

# Provider metadata overlay
metadata:
  # write_once: declared and earlier values are never replaced
  # overwrite: metadata values replace existing ones
  merge_policy: write_once

  # Variable types that may receive metadata
  enrichable_types:
    - string
    - number
    - bool
    - list(string)
    - set(string)
    - map

  # Resource type prefix required for output enrichment
  output_resource_prefix: ibm_

# Output options
output:
  pretty: true
  colored: true
"#
        .to_string()
    }

    /// Merge CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &crate::cli::InspectArgs) {
        if !args.exclude_patterns.is_empty() {
            self.load
                .exclude_patterns
                .extend(args.exclude_patterns.iter().cloned());
        }
        if args.no_legacy_fallback {
            self.load.legacy_fallback = false;
        }
        if let Some(depth) = args.max_depth {
            self.resolve.max_depth = depth;
        }
        if let Some(policy) = args.merge_policy {
            self.metadata.merge_policy = policy;
        }
        if args.compact {
            self.output.pretty = false;
        }
        if args.no_color {
            self.output.colored = false;
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unknown variables are left as is.
fn expand_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.load.legacy_fallback);
        assert_eq!(config.resolve.max_depth, 32);
        assert_eq!(config.resolve.init_dir, ".terraform");
        assert_eq!(config.metadata.merge_policy, MergePolicy::WriteOnce);
        assert_eq!(config.metadata.enrichable_types.len(), 6);
        assert_eq!(config.metadata.output_resource_prefix, "ibm_");
        assert!(config.output.pretty);
    }

    #[test]
    fn test_config_from_yaml_nested() {
        let yaml = r#"
load:
  exclude_patterns:
    - "generated_*.tf"
  legacy_fallback: false
resolve:
  max_depth: 4
metadata:
  merge_policy: overwrite
output:
  colored: false
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.load.exclude_patterns, vec!["generated_*.tf"]);
        assert!(!config.load.legacy_fallback);
        assert_eq!(config.resolve.max_depth, 4);
        // unspecified keys keep their defaults
        assert_eq!(config.resolve.modules_dir, "modules");
        assert_eq!(config.metadata.merge_policy, MergePolicy::Overwrite);
        assert_eq!(config.metadata.output_resource_prefix, "ibm_");
        assert!(!config.output.colored);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_cache_path() {
        let config = Config::default();
        assert_eq!(
            config.resolve.cache_path(Path::new("/work")),
            PathBuf::from("/work/.terraform/modules")
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let error = Config::from_yaml("resolve:\n  max_depth: 0\n").unwrap_err();
        assert!(matches!(error, InspectError::ConfigValue { ref key, .. } if key == "resolve.max_depth"));

        let error = Config::from_yaml("load:\n  exclude_patterns: [\"[\"]\n").unwrap_err();
        assert!(matches!(error, InspectError::ConfigValue { .. }));

        let error = Config::from_yaml("metadata:\n  merge_policy: sometimes\n").unwrap_err();
        assert!(matches!(error, InspectError::ConfigParse { .. }));
    }

    #[test]
    fn test_env_var_expansion() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(expand_env_vars("dir: ${PATH}"), format!("dir: {path}"));
        assert_eq!(expand_env_vars("dir: $PATH"), format!("dir: {path}"));

        // unknown variables are left untouched
        assert_eq!(
            expand_env_vars("x: ${TFINSPECT_SURELY_UNSET_VAR}"),
            "x: ${TFINSPECT_SURELY_UNSET_VAR}"
        );
        for pattern in ["no vars here", "$1", "${NESTED${VAR}}"] {
            let _ = expand_env_vars(pattern);
        }
    }

    #[test]
    fn test_example_yaml_is_valid() {
        let config = Config::from_yaml(&Config::example_yaml()).unwrap();
        assert_eq!(config.resolve.max_depth, 32);
        assert_eq!(config.metadata.enrichable_types, default_enrichable_types());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = Config::from_yaml("# nothing here\n\n").unwrap();
        assert!(config.load.legacy_fallback);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tfinspect.yaml");
        std::fs::write(&path, "resolve:\n  max_depth: 7\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().resolve.max_depth, 7);
        assert!(Config::from_file(&dir.path().join("missing.yaml")).is_err());
    }
}
