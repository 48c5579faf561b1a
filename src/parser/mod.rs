//! Configuration front end.
//!
//! Turns the `.tf` / `.tf.json` files of one directory into a raw [`Module`]
//! plus diagnostics. Two grammars are available behind the [`FrontEnd`]
//! trait; [`FrontEndChain`] tries the modern one first and falls back to the
//! legacy one only when the modern one reports errors.
//!
//! # Example
//!
//! ```rust,no_run
//! use tfinspect::fs::OsFs;
//! use tfinspect::parser::FrontEndChain;
//! use tfinspect::Config;
//! use std::path::Path;
//!
//! let chain = FrontEndChain::from_config(&Config::default());
//! let module = chain.load(&OsFs, Path::new("./terraform"));
//! println!("{} variables", module.variables.len());
//! ```

mod hcl;
mod json;

pub use self::hcl::{Grammar, HclFrontEnd, LegacyHclFrontEnd};

use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::fs::FileSystem;
use crate::types::{Module, SourcePos};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File extensions that hold configuration.
pub const TERRAFORM_EXTENSIONS: &[&str] = &[".tf.json", ".tf"];

/// Arguments of `resource` / `data` blocks that are not resource attributes.
pub const RESOURCE_META_ARGUMENTS: &[&str] =
    &["count", "for_each", "provider", "depends_on", "lifecycle"];

/// Arguments of `module` blocks that are not input variables.
pub const MODULE_META_ARGUMENTS: &[&str] = &[
    "source",
    "version",
    "count",
    "for_each",
    "providers",
    "depends_on",
];

/// A configuration loader for one directory.
///
/// Implementations return the module exactly as declared; implied provider
/// requirements and diagnostics are attached by [`FrontEndChain`].
pub trait FrontEnd: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Load every configuration file of `dir`.
    fn load(&self, fs: &dyn FileSystem, dir: &Path) -> (Module, Diagnostics);
}

/// Primary front end with an optional fallback.
pub struct FrontEndChain {
    primary: Box<dyn FrontEnd>,
    fallback: Option<Box<dyn FrontEnd>>,
}

impl FrontEndChain {
    #[must_use]
    pub fn new(primary: Box<dyn FrontEnd>, fallback: Option<Box<dyn FrontEnd>>) -> Self {
        Self { primary, fallback }
    }

    /// Modern grammar first, legacy grammar as fallback unless disabled.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let exclude = config.load.exclude_patterns.clone();
        let fallback: Option<Box<dyn FrontEnd>> = if config.load.legacy_fallback {
            Some(Box::new(LegacyHclFrontEnd::new(exclude.clone())))
        } else {
            None
        };
        Self::new(Box::new(HclFrontEnd::new(exclude)), fallback)
    }

    /// Load `dir`, keeping the fallback's result only if it is error-free.
    pub fn load(&self, fs: &dyn FileSystem, dir: &Path) -> Module {
        let (mut module, diagnostics) = self.primary.load(fs, dir);

        if diagnostics.has_errors() {
            if let Some(fallback) = &self.fallback {
                let (mut legacy, legacy_diagnostics) = fallback.load(fs, dir);
                if !legacy_diagnostics.has_errors() {
                    tracing::warn!(
                        dir = %dir.display(),
                        primary = self.primary.name(),
                        fallback = fallback.name(),
                        "Primary grammar failed, using fallback result"
                    );
                    legacy.init(legacy_diagnostics);
                    return legacy;
                }
                tracing::debug!(dir = %dir.display(), "Fallback grammar failed too");
            }
        }

        module.init(diagnostics);
        module
    }
}

impl std::fmt::Debug for FrontEndChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontEndChain")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.as_ref().map(|f| f.name()))
            .finish()
    }
}

/// One configuration file selected for loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub is_override: bool,
    pub is_json: bool,
}

/// List the configuration files of `dir`: primary files first, then override
/// files, each group in name order.
///
/// # Errors
///
/// Returns a "Failed to read module directory" diagnostic when `dir` cannot
/// be listed.
pub fn dir_files(
    fs: &dyn FileSystem,
    dir: &Path,
    exclude_patterns: &[String],
) -> std::result::Result<Vec<ConfigFile>, Diagnostic> {
    let entries = fs.read_dir(dir).map_err(|e| {
        tracing::debug!(dir = %dir.display(), error = %e, "Cannot list module directory");
        Diagnostic::error(
            "Failed to read module directory",
            format!(
                "Module directory {} does not exist or cannot be read.",
                dir.display()
            ),
        )
    })?;

    let mut primary = Vec::new();
    let mut overrides = Vec::new();
    for entry in entries {
        if entry.is_dir {
            continue;
        }
        let name = entry.name.as_str();
        let Some(ext) = file_ext(name) else {
            continue;
        };
        if is_ignored_file(name) || is_excluded(name, exclude_patterns) {
            tracing::debug!(file = name, "Skipping file");
            continue;
        }

        let base_name = &name[..name.len() - ext.len()];
        let file = ConfigFile {
            path: dir.join(name),
            is_override: base_name == "override" || base_name.ends_with("_override"),
            is_json: ext == ".tf.json",
        };
        if file.is_override {
            overrides.push(file);
        } else {
            primary.push(file);
        }
    }

    primary.extend(overrides);
    Ok(primary)
}

fn file_ext(name: &str) -> Option<&'static str> {
    TERRAFORM_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| name.ends_with(ext))
}

/// Hidden files, editor backups and emacs lock files.
fn is_ignored_file(name: &str) -> bool {
    name.starts_with('.') || name.ends_with('~') || (name.starts_with('#') && name.ends_with('#'))
}

fn is_excluded(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        glob::Pattern::new(pattern)
            .map(|p| p.matches(name))
            .unwrap_or(false)
    })
}

/// Insert a declaration. A repeated name is an error in a primary file and a
/// replacement in an override file.
pub(crate) fn declare<T>(
    map: &mut HashMap<String, T>,
    key: String,
    value: T,
    kind: &str,
    file: &ConfigFile,
    pos: &SourcePos,
    diagnostics: &mut Diagnostics,
) {
    if !file.is_override && map.contains_key(&key) {
        diagnostics.push(Diagnostic::error(
            format!("Duplicate {kind} declaration"),
            format!(
                "A {kind} named \"{key}\" was already declared; {}:{}",
                pos.filename, pos.line
            ),
        ));
        return;
    }
    map.insert(key, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use pretty_assertions::assert_eq;

    fn names(files: &[ConfigFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_dir_files_ordering_and_filters() {
        let mut fs = MemoryFs::new();
        fs.add_file("m/override.tf", "")
            .add_file("m/main.tf", "")
            .add_file("m/a_override.tf.json", "")
            .add_file("m/b.tf.json", "")
            .add_file("m/.hidden.tf", "")
            .add_file("m/backup.tf~", "")
            .add_file("m/#lock.tf#", "")
            .add_file("m/readme.md", "")
            .add_dir("m/sub.tf");

        let files = dir_files(&fs, Path::new("m"), &[]).unwrap();
        assert_eq!(
            names(&files),
            vec!["b.tf.json", "main.tf", "a_override.tf.json", "override.tf"]
        );
        assert!(files[0].is_json);
        assert!(!files[1].is_override);
        assert!(files[2].is_override);
    }

    #[test]
    fn test_dir_files_exclude_patterns() {
        let mut fs = MemoryFs::new();
        fs.add_file("m/main.tf", "").add_file("m/generated_x.tf", "");

        let files = dir_files(&fs, Path::new("m"), &["generated_*".to_string()]).unwrap();
        assert_eq!(names(&files), vec!["main.tf"]);
    }

    #[test]
    fn test_dir_files_missing_directory() {
        let fs = MemoryFs::new();
        let diagnostic = dir_files(&fs, Path::new("missing"), &[]).unwrap_err();
        assert_eq!(diagnostic.summary, "Failed to read module directory");
        assert!(diagnostic.is_error());
    }

    #[test]
    fn test_chain_falls_back_to_legacy_grammar() {
        let mut fs = MemoryFs::new();
        fs.add_file(
            "m/vars.tf",
            r#"
variable "zones" {
  type = "list"
}
"#,
        );

        let chain = FrontEndChain::from_config(&Config::default());
        let module = chain.load(&fs, Path::new("m"));
        assert!(!module.diagnostics.has_errors());
        assert_eq!(module.variables["zones"].type_name, "list");
    }

    #[test]
    fn test_chain_keeps_primary_result_when_both_fail() {
        let mut fs = MemoryFs::new();
        fs.add_file("m/broken.tf", "variable \"x\" {");

        let chain = FrontEndChain::from_config(&Config::default());
        let module = chain.load(&fs, Path::new("m"));
        assert!(module.diagnostics.has_errors());
    }

    #[test]
    fn test_chain_without_fallback() {
        let mut fs = MemoryFs::new();
        fs.add_file("m/vars.tf", "variable \"zones\" {\n  type = \"list\"\n}\n");

        let mut config = Config::default();
        config.load.legacy_fallback = false;
        let module = FrontEndChain::from_config(&config).load(&fs, Path::new("m"));
        assert!(module.diagnostics.has_errors());
    }

    #[test]
    fn test_duplicate_declaration_in_primary_file() {
        let mut fs = MemoryFs::new();
        fs.add_file("m/a.tf", "variable \"x\" {}\n")
            .add_file("m/b.tf", "variable \"x\" {}\n");

        let module = FrontEndChain::from_config(&Config::default()).load(&fs, Path::new("m"));
        assert!(module
            .diagnostics
            .iter()
            .any(|d| d.summary == "Duplicate variable declaration"));
    }

    #[test]
    fn test_override_file_replaces_declaration() {
        let mut fs = MemoryFs::new();
        fs.add_file("m/main.tf", "variable \"x\" {\n  description = \"base\"\n}\n")
            .add_file(
                "m/override.tf",
                "variable \"x\" {\n  description = \"override\"\n}\n",
            );

        let module = FrontEndChain::from_config(&Config::default()).load(&fs, Path::new("m"));
        assert!(module.diagnostics.is_empty());
        assert_eq!(module.variables["x"].description, "override");
    }
}
