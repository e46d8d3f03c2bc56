//! Filesystem seam used by planning, execution and backup.
//!
//! [`DiskFs`] is the production implementation. [`MemoryFs`] keeps the whole
//! tree in memory and can inject I/O failures, so every step of a sync can be
//! exercised without touching disk.

use crate::io;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};

pub trait Fs {
    /// True if a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Write `data` to `path`, replacing any existing file.
    fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Write `data` to `path`; fails with `AlreadyExists` if a file is there.
    fn write_new(&self, path: &Path, data: &[u8]) -> Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    fn set_readonly(&self, path: &Path) -> Result<()>;

    /// Names of the immediate children of a directory.
    fn list_dir(&self, path: &Path) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// DiskFs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFs;

impl Fs for DiskFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        io::ensure_dir(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        io::atomic_write(path, data)
    }

    fn write_new(&self, path: &Path, data: &[u8]) -> Result<()> {
        io::atomic_write_new(path, data)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::remove_dir_all(path)
    }

    fn set_readonly(&self, path: &Path) -> Result<()> {
        io::set_readonly(path)
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

// ---------------------------------------------------------------------------
// MemoryFs
// ---------------------------------------------------------------------------

type FaultMatcher = Box<dyn Fn(&Path) -> bool>;

struct Fault {
    matches: FaultMatcher,
    allow: usize,
    kind: ErrorKind,
}

/// In-memory filesystem. Single-threaded, like the sync itself.
#[derive(Default)]
pub struct MemoryFs {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RefCell<BTreeSet<PathBuf>>,
    readonly: RefCell<BTreeSet<PathBuf>>,
    writes: RefCell<Vec<PathBuf>>,
    fault: RefCell<Option<Fault>>,
    matched: Cell<usize>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories. Not recorded as a write.
    pub fn insert(&self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.add_dirs(parent);
        }
        self.files.borrow_mut().insert(path, data.into());
    }

    /// Content of a file, if present.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    /// All files at or below `root`, keyed by full path.
    pub fn files_under(&self, root: impl AsRef<Path>) -> BTreeMap<PathBuf, Vec<u8>> {
        let root = root.as_ref();
        self.files
            .borrow()
            .iter()
            .filter(|(p, _)| p.starts_with(root))
            .map(|(p, d)| (p.clone(), d.clone()))
            .collect()
    }

    /// Every path written so far, in order, including failed attempts.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.borrow().clone()
    }

    pub fn is_readonly(&self, path: impl AsRef<Path>) -> bool {
        self.readonly.borrow().contains(path.as_ref())
    }

    /// Make mutating calls on paths accepted by `matches` fail with `kind`
    /// once `allow` of them have succeeded.
    pub fn fail_after<F>(&self, allow: usize, kind: ErrorKind, matches: F)
    where
        F: Fn(&Path) -> bool + 'static,
    {
        self.matched.set(0);
        *self.fault.borrow_mut() = Some(Fault {
            matches: Box::new(matches),
            allow,
            kind,
        });
    }

    pub fn clear_fault(&self) {
        *self.fault.borrow_mut() = None;
    }

    fn check_fault(&self, path: &Path) -> Result<()> {
        let fault = self.fault.borrow();
        let Some(fault) = fault.as_ref() else {
            return Ok(());
        };
        if !(fault.matches)(path) {
            return Ok(());
        }
        let seen = self.matched.get();
        self.matched.set(seen + 1);
        if seen >= fault.allow {
            return Err(Error::new(
                fault.kind,
                format!("injected failure at {}", path.display()),
            ));
        }
        Ok(())
    }

    fn add_dirs(&self, path: &Path) {
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.borrow().contains(path)
    }

    fn put(&self, path: &Path, data: &[u8], replace: bool) -> Result<()> {
        self.writes.borrow_mut().push(path.to_path_buf());
        self.check_fault(path)?;
        let parent_ok = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => self.is_dir(p),
            _ => true,
        };
        if !parent_ok {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("parent directory missing for {}", path.display()),
            ));
        }
        if self.is_dir(path) {
            return Err(Error::new(
                ErrorKind::Other,
                format!("{} is a directory", path.display()),
            ));
        }
        let mut files = self.files.borrow_mut();
        if !replace && files.contains_key(path) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        files.insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }
}

impl Fs for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path) || self.is_dir(path)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files.borrow().get(path).cloned().ok_or_else(|| {
            Error::new(ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if self.is_dir(path) {
            return Ok(());
        }
        self.check_fault(path)?;
        if self.files.borrow().contains_key(path) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("{} is a file", path.display()),
            ));
        }
        self.add_dirs(path);
        Ok(())
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.put(path, data, true)
    }

    fn write_new(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.put(path, data, false)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.check_fault(to)?;
        if !self.exists(from) {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("{} not found", from.display()),
            ));
        }
        if self.exists(to) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }
        let rebase = |p: &Path| to.join(p.strip_prefix(from).unwrap_or(p));

        let mut files = self.files.borrow_mut();
        let moved: Vec<PathBuf> = files
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(data) = files.remove(&old) {
                files.insert(rebase(&old), data);
            }
        }
        drop(files);

        let mut readonly = self.readonly.borrow_mut();
        let moved: Vec<PathBuf> = readonly
            .iter()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            readonly.remove(&old);
            readonly.insert(rebase(&old));
        }
        drop(readonly);

        let mut dirs = self.dirs.borrow_mut();
        let moved: Vec<PathBuf> = dirs.iter().filter(|p| p.starts_with(from)).cloned().collect();
        for old in moved {
            dirs.remove(&old);
            dirs.insert(rebase(&old));
        }
        drop(dirs);
        if let Some(parent) = to.parent() {
            self.add_dirs(parent);
        }
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        if !self.is_dir(path) {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ));
        }
        self.files.borrow_mut().retain(|p, _| !p.starts_with(path));
        self.readonly.borrow_mut().retain(|p| !p.starts_with(path));
        self.dirs.borrow_mut().retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn set_readonly(&self, path: &Path) -> Result<()> {
        if !self.files.borrow().contains_key(path) {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ));
        }
        self.readonly.borrow_mut().insert(path.to_path_buf());
        Ok(())
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>> {
        if !self.is_dir(path) {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ));
        }
        let child_name = |p: &PathBuf| -> Option<String> {
            if p.parent() == Some(path) {
                p.file_name().map(|n| n.to_string_lossy().into_owned())
            } else {
                None
            }
        };
        let mut names: BTreeSet<String> = self.files.borrow().keys().filter_map(child_name).collect();
        names.extend(self.dirs.borrow().iter().filter_map(child_name));
        Ok(names.into_iter().collect())
    }
}
