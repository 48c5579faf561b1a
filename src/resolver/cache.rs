//! Index of the module cache written by `terraform init`.
//!
//! `.terraform/modules` holds one directory per downloaded module, named by
//! its qualified call name (`db`, `db.backup`, ...).

use crate::fs::FileSystem;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

/// Names of the cached module directories.
#[derive(Debug, Clone, Default)]
pub struct CacheIndex {
    root: PathBuf,
    entries: BTreeSet<String>,
}

impl CacheIndex {
    /// List the directories under `root`. Plain files (such as
    /// `modules.json`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns the listing error if `root` cannot be read.
    pub fn read(fs: &dyn FileSystem, root: &Path) -> io::Result<Self> {
        let entries = fs
            .read_dir(root)?
            .into_iter()
            .filter(|entry| entry.is_dir)
            .map(|entry| entry.name)
            .collect();
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    /// An index with no entries; every cache lookup misses.
    #[must_use]
    pub fn empty(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            entries: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// `<root>/<key>`, plus the package subfolder when there is one.
    #[must_use]
    pub fn path_for(&self, key: &str, subfolder: &str) -> PathBuf {
        let base = self.root.join(key);
        if subfolder.is_empty() {
            base
        } else {
            base.join(subfolder)
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    #[test]
    fn test_read_keeps_directories_only() {
        let mut fs = MemoryFs::new();
        fs.add_file("root/.terraform/modules/modules.json", "{}")
            .add_file("root/.terraform/modules/db/main.tf", "")
            .add_dir("root/.terraform/modules/db.backup");

        let index = CacheIndex::read(&fs, Path::new("root/.terraform/modules")).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.contains("db"));
        assert!(index.contains("db.backup"));
        assert!(!index.contains("modules.json"));
    }

    #[test]
    fn test_path_for_with_subfolder() {
        let index = CacheIndex::empty(Path::new("/w/.terraform/modules"));
        assert_eq!(index.path_for("db", ""), PathBuf::from("/w/.terraform/modules/db"));
        assert_eq!(
            index.path_for("consul", "modules/consul-cluster"),
            PathBuf::from("/w/.terraform/modules/consul/modules/consul-cluster")
        );
        assert!(index.is_empty());
    }

    #[test]
    fn test_read_missing_cache() {
        let fs = MemoryFs::new();
        assert!(CacheIndex::read(&fs, Path::new("root/.terraform/modules")).is_err());
    }
}
