//! Point-in-time copies of target files taken before a forced upgrade.
//!
//! Only the files about to be overwritten are copied, at their relative paths,
//! into a sibling directory such as `.claude.backup-20261016-101500/`. The copy
//! is assembled in a `.partial` staging directory and renamed into place once
//! every file is written, so a backup directory either holds every affected
//! file or does not exist.

use crate::error::{Result, SyncError};
use crate::fs::Fs;
use crate::paths;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupSnapshot {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    /// Relative paths held by the snapshot.
    pub files: Vec<PathBuf>,
}

/// A completed backup found next to a target root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub counter: u32,
}

/// Copy `affected` (relative to `target_root`) into a new backup directory.
///
/// On failure the staging directory is removed and nothing under
/// `target_root` has been modified.
pub fn snapshot<'a, I>(
    fs: &dyn Fs,
    target_root: &Path,
    affected: I,
    now: DateTime<Utc>,
) -> Result<BackupSnapshot>
where
    I: IntoIterator<Item = &'a Path>,
{
    let stamp = now.format(paths::BACKUP_TIMESTAMP_FORMAT).to_string();
    let dest = free_backup_dir(fs, target_root, &stamp);
    let staging = paths::staging_dir(&dest);

    let files: Vec<PathBuf> = affected.into_iter().map(Path::to_path_buf).collect();

    if let Err(err) = fill_staging(fs, target_root, &staging, &files) {
        discard(fs, &staging);
        return Err(err);
    }
    if let Err(source) = fs.rename(&staging, &dest) {
        discard(fs, &staging);
        return Err(SyncError::BackupIncomplete { path: dest, source });
    }

    for rel in &files {
        let path = dest.join(rel);
        if let Err(e) = fs.set_readonly(&path) {
            tracing::warn!(path = %path.display(), error = %e, "could not mark backup file read-only");
        }
    }

    tracing::info!(backup = %dest.display(), files = files.len(), "backup written");
    Ok(BackupSnapshot {
        path: dest,
        created_at: now,
        files,
    })
}

/// First `<name>.backup-<stamp>[-N]` whose final and staging paths are free.
fn free_backup_dir(fs: &dyn Fs, target_root: &Path, stamp: &str) -> PathBuf {
    let mut counter = 0;
    loop {
        let candidate = paths::backup_dir(target_root, stamp, counter);
        if !fs.exists(&candidate) && !fs.exists(&paths::staging_dir(&candidate)) {
            return candidate;
        }
        counter += 1;
    }
}

fn fill_staging(fs: &dyn Fs, target_root: &Path, staging: &Path, files: &[PathBuf]) -> Result<()> {
    let incomplete = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| SyncError::BackupIncomplete { path, source }
    };

    fs.create_dir_all(staging).map_err(incomplete(staging))?;
    for rel in files {
        let original = target_root.join(rel);
        let data = fs.read(&original).map_err(incomplete(&original))?;
        let copy = staging.join(rel);
        if let Some(parent) = copy.parent() {
            fs.create_dir_all(parent).map_err(incomplete(parent))?;
        }
        fs.write_new(&copy, &data).map_err(incomplete(&copy))?;
    }
    Ok(())
}

fn discard(fs: &dyn Fs, staging: &Path) {
    if !fs.exists(staging) {
        return;
    }
    if let Err(e) = fs.remove_dir_all(staging) {
        tracing::warn!(path = %staging.display(), error = %e, "could not remove incomplete backup");
    }
}

/// Completed backups of `target_root`, newest first.
pub fn list_backups(fs: &dyn Fs, target_root: &Path) -> Result<Vec<BackupEntry>> {
    let parent = paths::backup_parent(target_root);
    if !fs.exists(&parent) {
        return Ok(Vec::new());
    }

    let mut entries: Vec<BackupEntry> = fs
        .list_dir(&parent)?
        .into_iter()
        .filter_map(|name| {
            let (stamp, counter) = paths::parse_backup_name(target_root, &name)?;
            let naive = NaiveDateTime::parse_from_str(&stamp, paths::BACKUP_TIMESTAMP_FORMAT).ok()?;
            Some(BackupEntry {
                path: parent.join(&name),
                created_at: naive.and_utc(),
                counter,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then(b.counter.cmp(&a.counter))
    });
    Ok(entries)
}
