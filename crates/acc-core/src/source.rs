use crate::bundle;
use crate::error::{Result, SyncError};
use crate::paths;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Immutable snapshot of a component tree: relative path → bytes.
///
/// Captured once before planning so that the plan and its execution see the
/// same content even if the directory it came from changes mid-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSourceTree {
    root: PathBuf,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl ComponentSourceTree {
    /// Snapshot every file under `root`. Symlinks are followed and their
    /// resolved content is captured.
    pub fn load(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(SyncError::SourceUnavailable {
                path: root.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let mut files = BTreeMap::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                SyncError::SourceUnavailable {
                    path,
                    source: e.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .map_err(|_| SyncError::InvalidSourcePath(entry.path().to_path_buf()))?;
            let data = std::fs::read(entry.path()).map_err(|source| {
                SyncError::SourceUnavailable {
                    path: entry.path().to_path_buf(),
                    source,
                }
            })?;
            files.insert(rel.to_path_buf(), data);
        }

        tracing::debug!(root = %root.display(), files = files.len(), "loaded component source");
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    /// Build a snapshot from in-memory entries. `root` is only a label.
    pub fn from_entries<I, P, D>(root: impl Into<PathBuf>, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, D)>,
        P: AsRef<Path>,
        D: Into<Vec<u8>>,
    {
        let mut files = BTreeMap::new();
        for (path, data) in entries {
            let path = path.as_ref();
            paths::validate_relative(path)?;
            files.insert(paths::normalize_relative(path), data.into());
        }
        Ok(Self {
            root: root.into(),
            files,
        })
    }

    /// The component tree compiled into this binary.
    pub fn bundled() -> Result<Self> {
        Self::from_entries(bundle::BUNDLE_LABEL, bundle::files())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, rel: &Path) -> Option<&[u8]> {
        self.files.get(rel).map(Vec::as_slice)
    }

    /// Relative paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Where a sync reads its components from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A component tree on disk.
    Dir(PathBuf),
    /// The tree embedded in the binary.
    Bundled,
}

impl SourceSpec {
    pub fn load(&self) -> Result<ComponentSourceTree> {
        match self {
            SourceSpec::Dir(dir) => ComponentSourceTree::load(dir),
            SourceSpec::Bundled => ComponentSourceTree::bundled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_captures_nested_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("commands")).unwrap();
        std::fs::create_dir_all(root.join("skills/testing/references")).unwrap();
        std::fs::create_dir_all(root.join("agents/empty")).unwrap();
        std::fs::write(root.join("commands/acc-commit.md"), "commit").unwrap();
        std::fs::write(root.join("skills/testing/SKILL.md"), "skill").unwrap();
        std::fs::write(root.join("skills/testing/references/a.md"), "ref").unwrap();

        let tree = ComponentSourceTree::load(root).unwrap();
        let paths: Vec<&Path> = tree.paths().collect();
        assert_eq!(
            paths,
            vec![
                Path::new("commands/acc-commit.md"),
                Path::new("skills/testing/SKILL.md"),
                Path::new("skills/testing/references/a.md"),
            ]
        );
        assert_eq!(tree.get(Path::new("commands/acc-commit.md")), Some(&b"commit"[..]));
    }

    #[test]
    fn load_missing_root_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = ComponentSourceTree::load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SyncError::SourceUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn load_follows_symlinks() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("src");
        std::fs::create_dir_all(root.join("commands")).unwrap();
        std::fs::write(dir.path().join("real.md"), "resolved").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.md"), root.join("commands/link.md"))
            .unwrap();

        let tree = ComponentSourceTree::load(&root).unwrap();
        assert_eq!(tree.get(Path::new("commands/link.md")), Some(&b"resolved"[..]));
    }

    #[test]
    fn from_entries_rejects_escaping_paths() {
        let err = ComponentSourceTree::from_entries("mem", [("../x.md", "x")]).unwrap_err();
        assert!(matches!(err, SyncError::InvalidSourcePath(_)));
    }

    #[test]
    fn bundled_tree_ships_every_category() {
        let tree = ComponentSourceTree::bundled().unwrap();
        assert!(!tree.is_empty());
        for prefix in ["commands", "agents", "skills"] {
            assert!(
                tree.paths().any(|p| p.starts_with(prefix)),
                "bundle has no {prefix}"
            );
        }
    }
}
