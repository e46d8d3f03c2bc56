use crate::backup::{self, BackupSnapshot};
use crate::error::{Result, SyncError};
use crate::fs::Fs;
use crate::merge;
use crate::plan::{plan, SyncMode};
use crate::report::UpgradeReport;
use crate::source::ComponentSourceTree;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Non-destructive sync: create what is missing, skip everything else.
/// Never takes a backup and never overwrites.
pub fn install(source: &ComponentSourceTree, target_root: &Path, fs: &dyn Fs) -> Result<UpgradeReport> {
    let plan = plan(source, target_root, SyncMode::Preserve, fs);
    merge::execute(&plan, source, fs)
}

/// Forced sync: back up every file about to be overwritten, then overwrite.
pub fn upgrade(source: &ComponentSourceTree, target_root: &Path, fs: &dyn Fs) -> Result<UpgradeReport> {
    upgrade_at(source, target_root, fs, Utc::now())
}

/// [`upgrade`] with an explicit backup timestamp.
pub fn upgrade_at(
    source: &ComponentSourceTree,
    target_root: &Path,
    fs: &dyn Fs,
    now: DateTime<Utc>,
) -> Result<UpgradeReport> {
    let plan = plan(source, target_root, SyncMode::Force, fs);

    // The snapshot must be complete before the first overwrite.
    let snapshot: Option<BackupSnapshot> = if plan.has_overwrites() {
        Some(backup::snapshot(fs, target_root, plan.overwrites(), now)?)
    } else {
        tracing::debug!(target = %target_root.display(), "nothing to overwrite, no backup taken");
        None
    };
    let backup_path = snapshot.map(|s| s.path);

    match merge::execute(&plan, source, fs) {
        Ok(mut report) => {
            report.backup = backup_path;
            Ok(report)
        }
        Err(mut err) => {
            if let SyncError::PartialExecution { report, .. } = &mut err {
                report.backup = backup_path;
            }
            Err(err)
        }
    }
}
