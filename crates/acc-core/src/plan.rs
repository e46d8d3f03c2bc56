use crate::fs::Fs;
use crate::source::ComponentSourceTree;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Create missing files, never touch existing ones.
    #[default]
    Preserve,
    /// Overwrite every existing file with the source version.
    Force,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Preserve => f.write_str("preserve"),
            SyncMode::Force => f.write_str("force"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Skip,
    Create,
    Overwrite,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Skip => f.write_str("skip"),
            Action::Create => f.write_str("create"),
            Action::Overwrite => f.write_str("overwrite"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub path: PathBuf,
    pub action: Action,
}

/// Everything a run will do, decided before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyPlan {
    pub mode: SyncMode,
    pub target_root: PathBuf,
    pub entries: Vec<PlanEntry>,
}

impl CopyPlan {
    pub fn count(&self, action: Action) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }

    /// Relative paths this plan will overwrite.
    pub fn overwrites(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|e| e.action == Action::Overwrite)
            .map(|e| e.path.as_path())
    }

    pub fn has_overwrites(&self) -> bool {
        self.overwrites().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decide what to do with every source file. Reads target existence only.
///
/// Each entry depends on its own path alone; files in `target_root` with no
/// source counterpart never appear in the plan.
pub fn plan(
    source: &ComponentSourceTree,
    target_root: &Path,
    mode: SyncMode,
    fs: &dyn Fs,
) -> CopyPlan {
    let entries = source
        .paths()
        .map(|rel| {
            let exists = fs.exists(&target_root.join(rel));
            let action = match (mode, exists) {
                (_, false) => Action::Create,
                (SyncMode::Preserve, true) => Action::Skip,
                (SyncMode::Force, true) => Action::Overwrite,
            };
            tracing::debug!(path = %rel.display(), %action, "planned");
            PlanEntry {
                path: rel.to_path_buf(),
                action,
            }
        })
        .collect();

    CopyPlan {
        mode,
        target_root: target_root.to_path_buf(),
        entries,
    }
}
