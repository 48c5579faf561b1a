//! Pluggable filesystem used by the front end and the module resolver.
//!
//! [`OsFs`] reads the real disk; [`MemoryFs`] holds a tree in memory so that
//! whole module hierarchies (including `.terraform/modules` caches) can be
//! described inline in tests or by embedders.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File or directory name (no path)
    pub name: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

/// Read-only filesystem operations needed by the inspector.
pub trait FileSystem: Send + Sync {
    /// List the immediate children of `dir`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` does not exist or is not a readable directory.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    /// Read a whole file as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Identity of a directory for cycle detection. Two paths naming the same
    /// directory map to the same value.
    fn canonicalize(&self, path: &Path) -> PathBuf {
        normalize_path(path)
    }
}

/// The operating system filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            ));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(io::Error::from(e)),
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            // symlinks count as directories only if their target is one
            let is_dir = entry.file_type().is_dir()
                || (entry.path_is_symlink()
                    && std::fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()));
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| normalize_path(path))
    }
}

/// In-memory filesystem. Directories are implied by file paths and can also be
/// created empty with [`MemoryFs::add_dir`].
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeMap<PathBuf, ()>,
}

impl MemoryFs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating its parent directories.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) -> &mut Self {
        let path = normalize_path(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path, content.into());
        self
    }

    /// Add an (empty) directory and its ancestors.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let mut current = normalize_path(path.as_ref());
        loop {
            self.dirs.insert(current.clone(), ());
            match current.parent() {
                Some(parent) if parent != current && !parent.as_os_str().is_empty() => {
                    current = parent.to_path_buf();
                }
                _ => break,
            }
        }
        self
    }
}

impl FileSystem for MemoryFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let dir = normalize_path(dir);
        if !self.dirs.contains_key(&dir) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            ));
        }

        let mut entries: BTreeMap<String, bool> = BTreeMap::new();
        for path in self.dirs.keys() {
            if path.parent() == Some(dir.as_path()) && *path != dir {
                if let Some(name) = path.file_name() {
                    entries.insert(name.to_string_lossy().into_owned(), true);
                }
            }
        }
        for path in self.files.keys() {
            if path.parent() == Some(dir.as_path()) {
                if let Some(name) = path.file_name() {
                    entries.insert(name.to_string_lossy().into_owned(), false);
                }
            }
        }

        Ok(entries
            .into_iter()
            .map(|(name, is_dir)| DirEntry { name, is_dir })
            .collect())
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                )
            })
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Does not touch the filesystem.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_with_parent = matches!(
                    out.components().next_back(),
                    Some(Component::ParentDir) | None
                );
                if ends_with_parent {
                    if !out.has_root() {
                        out.push("..");
                    }
                } else {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
