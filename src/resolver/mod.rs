//! Recursive module resolution and the full inspection pipeline.
//!
//! [`Inspector::inspect`] loads a root directory and every module it calls,
//! depth first in call-name order. Per directory the steps are:
//!
//! 1. front end load ([`FrontEndChain`])
//! 2. data source tracing, then managed resource tracing ([`Tracer`])
//! 3. module calls: resolve each child directory, inspect it recursively and
//!    fold its provenance into the caller's variables
//! 4. output tracing
//!
//! Child directories come either from a local path or from the module cache
//! written by `terraform init` (see [`CacheIndex`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use tfinspect::{Config, Inspector};
//! use std::path::Path;
//!
//! let inspector = Inspector::new(Config::default());
//! let inspection = inspector
//!     .inspect(Path::new("./terraform"), Some(Path::new("metadata.json")))
//!     .unwrap();
//! if let Some(module) = &inspection.module {
//!     println!("{} variables", module.variables.len());
//! }
//! ```

mod cache;
mod source;

pub use cache::CacheIndex;
pub use source::{is_local, strip_source, subfolder, SourceAddress, SourceKind};

use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{InspectError, Result};
use crate::fs::{FileSystem, OsFs};
use crate::metadata::{absorb_variable, is_enrichable, ProviderMetadata};
use crate::ordered::sorted_keys;
use crate::parser::FrontEndChain;
use crate::tracer::Tracer;
use crate::types::Module;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The root has no `.terraform` directory.
pub const INIT_DIR_ERROR: &str = "initDirErr";
/// The metadata document could not be read.
pub const METADATA_READ_ERROR: &str = "metadataErr";
/// The metadata document is not a JSON object.
pub const METADATA_PARSE_ERROR: &str = "unmarshalErr";
/// A non-local source with no module cache entry.
pub const MODULE_PATH_ERROR: &str = "module path error";
/// A call that resolves to one of its own ancestors.
pub const MODULE_CYCLE_ERROR: &str = "module cycle error";
/// A call nested deeper than `resolve.max_depth`.
pub const MODULE_DEPTH_ERROR: &str = "module depth error";

/// Result of [`Inspector::inspect`].
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    /// `None` only when the init directory is missing
    pub module: Option<Module>,
    /// Every diagnostic of the run, in the order raised
    pub diagnostics: Diagnostics,
}

impl Inspection {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Entry point for loading and enriching configuration directories.
pub struct Inspector {
    config: Config,
    fs: Box<dyn FileSystem>,
    front_end: FrontEndChain,
}

impl Inspector {
    /// Inspector on the real filesystem with the configured front ends.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let front_end = FrontEndChain::from_config(&config);
        Self {
            config,
            fs: Box::new(OsFs),
            front_end,
        }
    }

    #[must_use]
    pub fn with_filesystem(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    #[must_use]
    pub fn with_front_end(mut self, front_end: FrontEndChain) -> Self {
        self.front_end = front_end;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the front end on `dir` only. No init directory is required and
    /// nothing is traced or resolved.
    ///
    /// # Errors
    ///
    /// `DirectoryNotFound` if `dir` cannot be listed.
    pub fn load_module(&self, dir: &Path) -> Result<Module> {
        self.check_root(dir)?;
        let module = self.front_end.load(self.fs.as_ref(), dir);
        tracing::info!(
            dir = %dir.display(),
            variables = module.variables.len(),
            resources = module.resource_count(),
            diagnostics = module.diagnostics.len(),
            "Module loaded"
        );
        Ok(module)
    }

    /// Full pipeline with the metadata document at `metadata` (if any).
    ///
    /// A missing init directory yields an inspection without a module. An
    /// unreadable or malformed metadata document is reported as a diagnostic
    /// and the module is still returned, unenriched.
    ///
    /// # Errors
    ///
    /// `DirectoryNotFound` if `dir` cannot be listed.
    pub fn inspect(&self, dir: &Path, metadata: Option<&Path>) -> Result<Inspection> {
        self.check_root(dir)?;
        if let Some(failed) = self.check_init_dir(dir) {
            return Ok(failed);
        }

        let (metadata, diagnostics) = match metadata {
            None => (ProviderMetadata::default(), Diagnostics::new()),
            Some(path) => match ProviderMetadata::from_path(path) {
                Ok(metadata) => {
                    let warnings = metadata.warnings().clone();
                    (metadata, warnings)
                }
                Err(e) => {
                    let summary = match e {
                        InspectError::MetadataRead { .. } => METADATA_READ_ERROR,
                        _ => METADATA_PARSE_ERROR,
                    };
                    tracing::warn!(path = %path.display(), error = %e, "Metadata overlay skipped");
                    (ProviderMetadata::default(), vec![e.to_diagnostic(summary)].into())
                }
            },
        };

        Ok(self.run(dir, &metadata, diagnostics))
    }

    /// Full pipeline with an already parsed metadata document.
    ///
    /// # Errors
    ///
    /// `DirectoryNotFound` if `dir` cannot be listed.
    pub fn inspect_with_metadata(&self, dir: &Path, metadata: &ProviderMetadata) -> Result<Inspection> {
        self.check_root(dir)?;
        if let Some(failed) = self.check_init_dir(dir) {
            return Ok(failed);
        }
        Ok(self.run(dir, metadata, metadata.warnings().clone()))
    }

    fn check_root(&self, dir: &Path) -> Result<()> {
        self.fs.read_dir(dir).map(|_| ()).map_err(|e| {
            tracing::debug!(dir = %dir.display(), error = %e, "Root directory unreadable");
            crate::err!(DirectoryNotFound {
                path: dir.to_path_buf(),
            })
        })
    }

    fn check_init_dir(&self, dir: &Path) -> Option<Inspection> {
        let init_path = self.config.resolve.init_path(dir);
        let error = self.fs.read_dir(&init_path).err()?;
        tracing::warn!(dir = %dir.display(), "Init directory missing");
        let diagnostic = Diagnostic::error(
            INIT_DIR_ERROR,
            format!(
                "Failed to read init module directory of {}. Please run terraform init if it is not run earlier to load the modules: {error}",
                init_path.display()
            ),
        );
        Some(Inspection {
            module: None,
            diagnostics: vec![diagnostic].into(),
        })
    }

    fn run(&self, dir: &Path, metadata: &ProviderMetadata, extra: Diagnostics) -> Inspection {
        let cache_root = self.config.resolve.cache_path(dir);
        let cache = match CacheIndex::read(self.fs.as_ref(), &cache_root) {
            Ok(cache) => {
                tracing::debug!(entries = cache.len(), "Module cache indexed");
                cache
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "No modules downloaded");
                CacheIndex::empty(&cache_root)
            }
        };

        let walk = Walk {
            inspector: self,
            tracer: Tracer::new(metadata, &self.config.metadata),
            cache,
        };
        let mut ancestors = vec![self.fs.canonicalize(dir)];
        let mut module = walk.load_tree(dir, None, &mut ancestors);
        module.diagnostics.extend(extra);

        tracing::info!(
            dir = %dir.display(),
            module_calls = module.module_calls.len(),
            diagnostics = module.diagnostics.len(),
            errors = module.diagnostics.error_count(),
            "Inspection complete"
        );

        Inspection {
            diagnostics: module.diagnostics.clone(),
            module: Some(module),
        }
    }
}

impl std::fmt::Debug for Inspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("config", &self.config)
            .field("front_end", &self.front_end)
            .finish_non_exhaustive()
    }
}

/// State of one inspection run.
struct Walk<'a> {
    inspector: &'a Inspector,
    tracer: Tracer<'a>,
    cache: CacheIndex,
}

impl Walk<'_> {
    /// Load and enrich `dir`. `qualified` is the dotted call path from the
    /// root (`None` for the root itself); `ancestors` holds the canonical
    /// directories currently being loaded, root first.
    fn load_tree(&self, dir: &Path, qualified: Option<&str>, ancestors: &mut Vec<PathBuf>) -> Module {
        tracing::debug!(dir = %dir.display(), module = qualified.unwrap_or("<root>"), "Loading directory");

        let mut module = self.inspector.front_end.load(self.inspector.fs.as_ref(), dir);
        if let Some(q) = qualified {
            module.diagnostics = std::mem::take(&mut module.diagnostics).in_module(q);
        }

        self.tracer.trace_resources(&mut module);
        self.resolve_calls(&mut module, dir, qualified, ancestors);
        self.tracer.trace_outputs(&mut module);
        module
    }

    fn report(module: &mut Module, qualified: Option<&str>, diagnostic: Diagnostic) {
        let diagnostics = Diagnostics::from(vec![diagnostic]);
        module.diagnostics.extend(match qualified {
            Some(q) => diagnostics.in_module(q),
            None => diagnostics,
        });
    }

    fn resolve_calls(
        &self,
        module: &mut Module,
        dir: &Path,
        qualified: Option<&str>,
        ancestors: &mut Vec<PathBuf>,
    ) {
        let max_depth = self.inspector.config.resolve.max_depth;

        for name in sorted_keys(&module.module_calls) {
            let call = &module.module_calls[&name];
            if call.attributes.is_empty() {
                tracing::debug!(module = %name, "Skipping call without arguments");
                continue;
            }
            let source = call.source.clone();
            let key = match qualified {
                Some(parent) => format!("{parent}.{name}"),
                None => name.clone(),
            };

            let child_dir = if is_local(&source) {
                dir.join(&source)
            } else if self.cache.contains(&key) {
                self.cache.path_for(&key, &subfolder(&source))
            } else {
                let address = SourceAddress::parse(&source);
                tracing::warn!(module = %key, source = %address, "Module not found in cache");
                Self::report(
                    module,
                    qualified,
                    Diagnostic::error(
                        MODULE_PATH_ERROR,
                        format!(
                            "module source {source} is either incorrect or not supported by this tool ({} address, no cache entry '{key}')",
                            address.kind.label()
                        ),
                    ),
                );
                break;
            };

            let normalized = self.inspector.fs.canonicalize(&child_dir);
            if ancestors.contains(&normalized) {
                Self::report(
                    module,
                    qualified,
                    Diagnostic::error(
                        MODULE_CYCLE_ERROR,
                        format!(
                            "module \"{name}\" resolves to {}, which is already being loaded",
                            normalized.display()
                        ),
                    ),
                );
                continue;
            }
            if ancestors.len() > max_depth {
                Self::report(
                    module,
                    qualified,
                    Diagnostic::error(
                        MODULE_DEPTH_ERROR,
                        format!("module \"{name}\" exceeds the maximum nesting depth of {max_depth}"),
                    ),
                );
                continue;
            }

            tracing::info!(module = %name, path = %child_dir.display(), "Loading module");
            ancestors.push(normalized);
            let child = self.load_tree(&child_dir, Some(&key), ancestors);
            ancestors.pop();

            self.absorb(module, &name, child);
        }
    }

    /// Fold a resolved child into its call record and the caller's variables.
    fn absorb(&self, parent: &mut Module, name: &str, child: Module) {
        let options = &self.inspector.config.metadata;
        let Module {
            variables: child_variables,
            outputs,
            managed_resources,
            data_resources,
            diagnostics,
            ..
        } = child;

        let Some(call) = parent.module_calls.get_mut(name) else {
            return;
        };
        if !managed_resources.is_empty() {
            call.managed_resources = managed_resources;
        }
        if !data_resources.is_empty() {
            call.data_resources = data_resources;
        }
        if !outputs.is_empty() {
            call.outputs = outputs;
        }

        let bindings: Vec<(String, String)> = sorted_keys(&call.attributes)
            .into_iter()
            .filter_map(|attribute| {
                let variable = call.attributes[&attribute].variable_name()?.to_string();
                Some((attribute, variable))
            })
            .collect();

        let prefix = format!("module.{name}");
        for (attribute, variable_name) in bindings {
            let Some(variable) = parent.variables.get_mut(&variable_name) else {
                continue;
            };
            match child_variables.get(&attribute) {
                Some(inner)
                    if !inner.source.is_empty()
                        && is_enrichable(&variable.type_name, &options.enrichable_types) =>
                {
                    absorb_variable(variable, inner, options.merge_policy);
                    variable.add_sources(inner.source.iter().map(|s| format!("{prefix}.{s}")));
                }
                _ => variable.add_sources([prefix.clone()]),
            }
        }

        parent.diagnostics.extend(diagnostics);
    }
}
