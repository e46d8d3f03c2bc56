use crate::paths;
use crate::plan::{Action, SyncMode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Top-level component kind, taken from the first path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Commands,
    Agents,
    Skills,
    Other,
}

impl Category {
    pub fn of(path: &Path) -> Self {
        let first = path.components().find_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        });
        match first.and_then(|s| s.to_str()) {
            Some(paths::COMMANDS_DIR) => Category::Commands,
            Some(paths::AGENTS_DIR) => Category::Agents,
            Some(paths::SKILLS_DIR) => Category::Skills,
            _ => Category::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Commands => "commands",
            Category::Agents => "agents",
            Category::Skills => "skills",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub skipped: usize,
    pub created: usize,
    pub overwritten: usize,
}

impl CategoryCounts {
    fn bump(&mut self, action: Action) {
        match action {
            Action::Skip => self.skipped += 1,
            Action::Create => self.created += 1,
            Action::Overwrite => self.overwritten += 1,
        }
    }
}

/// Outcome of executing a [`CopyPlan`](crate::plan::CopyPlan).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    pub mode: SyncMode,
    pub target_root: PathBuf,
    pub skipped: usize,
    pub created: usize,
    pub overwritten: usize,
    pub by_category: BTreeMap<Category, CategoryCounts>,
    pub backup: Option<PathBuf>,
}

impl UpgradeReport {
    pub fn new(mode: SyncMode, target_root: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            target_root: target_root.into(),
            ..Self::default()
        }
    }

    /// Tally one finished entry.
    pub fn record(&mut self, path: &Path, action: Action) {
        match action {
            Action::Skip => self.skipped += 1,
            Action::Create => self.created += 1,
            Action::Overwrite => self.overwritten += 1,
        }
        self.by_category
            .entry(Category::of(path))
            .or_default()
            .bump(action);
    }

    pub fn total(&self) -> usize {
        self.skipped + self.created + self.overwritten
    }

    /// Files whose bytes were written.
    pub fn written(&self) -> usize {
        self.created + self.overwritten
    }
}
