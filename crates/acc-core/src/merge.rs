use crate::error::{Result, SyncError};
use crate::fs::Fs;
use crate::plan::{Action, CopyPlan, PlanEntry, SyncMode};
use crate::report::UpgradeReport;
use crate::source::ComponentSourceTree;
use std::io;
use std::path::PathBuf;

/// Carry out `plan` against the filesystem.
///
/// Skip entries are tallied without being opened. The first failing write
/// stops the run; the returned [`SyncError::PartialExecution`] carries what
/// was finished so a rerun can complete the rest.
pub fn execute(plan: &CopyPlan, source: &ComponentSourceTree, fs: &dyn Fs) -> Result<UpgradeReport> {
    fs.create_dir_all(&plan.target_root)
        .map_err(|source| SyncError::TargetUnwritable {
            path: plan.target_root.clone(),
            source,
        })?;

    let mut report = UpgradeReport::new(plan.mode, &plan.target_root);

    for (i, entry) in plan.entries.iter().enumerate() {
        match apply(plan, entry, source, fs) {
            Ok(action) => report.record(&entry.path, action),
            Err(err) => {
                tracing::warn!(path = %entry.path.display(), error = %err, "sync stopped");
                return Err(SyncError::PartialExecution {
                    path: plan.target_root.join(&entry.path),
                    source: err,
                    report: Box::new(report),
                    completed: paths_of(&plan.entries[..i]),
                    unattempted: paths_of(&plan.entries[i + 1..]),
                });
            }
        }
    }

    tracing::info!(
        mode = %plan.mode,
        created = report.created,
        overwritten = report.overwritten,
        skipped = report.skipped,
        "sync complete"
    );
    Ok(report)
}

/// Apply one entry and return the action that actually happened.
fn apply(
    plan: &CopyPlan,
    entry: &PlanEntry,
    source: &ComponentSourceTree,
    fs: &dyn Fs,
) -> io::Result<Action> {
    if entry.action == Action::Skip {
        return Ok(Action::Skip);
    }

    let data = source.get(&entry.path).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not in the component source", entry.path.display()),
        )
    })?;
    let dest = plan.target_root.join(&entry.path);
    if let Some(parent) = dest.parent() {
        fs.create_dir_all(parent)?;
    }

    match plan.mode {
        SyncMode::Preserve => match fs.write_new(&dest, data) {
            Ok(()) => {}
            // Appeared after planning: leave it alone.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %entry.path.display(), "appeared since planning, skipped");
                return Ok(Action::Skip);
            }
            Err(e) => return Err(e),
        },
        SyncMode::Force => fs.write(&dest, data)?,
    }

    tracing::debug!(path = %entry.path.display(), action = %entry.action, "applied");
    Ok(entry.action)
}

fn paths_of(entries: &[PlanEntry]) -> Vec<PathBuf> {
    entries.iter().map(|e| e.path.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::plan::plan;
    use std::path::Path;

    const TARGET: &str = "/p/.claude";

    fn source() -> ComponentSourceTree {
        ComponentSourceTree::from_entries(
            "src",
            [
                ("agents/reviewer.md", &b"agent"[..]),
                ("commands/acc-commit.md", &b"commit\r\n"[..]),
                ("skills/testing/SKILL.md", &b"skill"[..]),
            ],
        )
        .unwrap()
    }

    fn sync(fs: &MemoryFs, mode: SyncMode) -> Result<UpgradeReport> {
        let src = source();
        let plan = plan(&src, Path::new(TARGET), mode, fs);
        execute(&plan, &src, fs)
    }

    #[test]
    fn install_into_empty_target() {
        let fs = MemoryFs::new();
        let report = sync(&fs, SyncMode::Preserve).unwrap();
        assert_eq!((report.created, report.skipped, report.overwritten), (3, 0, 0));
        assert_eq!(
            fs.get("/p/.claude/commands/acc-commit.md").unwrap(),
            b"commit\r\n"
        );
        assert!(fs.exists(Path::new("/p/.claude/skills/testing")));
    }

    #[test]
    fn install_never_opens_existing_files() {
        let fs = MemoryFs::new();
        fs.insert("/p/.claude/commands/acc-commit.md", "custom");
        let report = sync(&fs, SyncMode::Preserve).unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(fs.get("/p/.claude/commands/acc-commit.md").unwrap(), b"custom");
        assert!(!fs
            .writes()
            .contains(&PathBuf::from("/p/.claude/commands/acc-commit.md")));
    }

    #[test]
    fn install_is_idempotent() {
        let fs = MemoryFs::new();
        fs.insert("/p/.claude/agents/reviewer.md", "mine");
        sync(&fs, SyncMode::Preserve).unwrap();
        let first = fs.files_under(TARGET);

        let report = sync(&fs, SyncMode::Preserve).unwrap();
        assert_eq!(report.skipped, 3);
        assert_eq!(report.written(), 0);
        assert_eq!(fs.files_under(TARGET), first);
    }

    #[test]
    fn preserve_create_racing_a_new_file_is_skipped() {
        let fs = MemoryFs::new();
        let src = source();
        let plan = plan(&src, Path::new(TARGET), SyncMode::Preserve, &fs);
        fs.insert("/p/.claude/agents/reviewer.md", "arrived late");

        let report = execute(&plan, &src, &fs).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 2);
        assert_eq!(fs.get("/p/.claude/agents/reviewer.md").unwrap(), b"arrived late");
    }

    #[test]
    fn force_converges_to_source() {
        let fs = MemoryFs::new();
        fs.insert("/p/.claude/commands/acc-commit.md", "custom");
        fs.insert("/p/.claude/commands/my-custom.md", "mine");
        let report = sync(&fs, SyncMode::Force).unwrap();

        assert_eq!(report.overwritten, 1);
        assert_eq!(report.created, 2);
        let src = source();
        for rel in src.paths() {
            assert_eq!(
                fs.get(Path::new(TARGET).join(rel)).as_deref(),
                src.get(rel),
                "{}",
                rel.display()
            );
        }
        assert_eq!(fs.get("/p/.claude/commands/my-custom.md").unwrap(), b"mine");
    }

    #[test]
    fn failure_reports_completed_and_unattempted() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new(TARGET)).unwrap();
        fs.fail_after(1, io::ErrorKind::StorageFull, |p| {
            p.extension().is_some_and(|e| e == "md")
        });

        let (path, source, report, completed, unattempted) =
            match sync(&fs, SyncMode::Preserve).unwrap_err() {
                SyncError::PartialExecution {
                    path,
                    source,
                    report,
                    completed,
                    unattempted,
                } => (path, source, report, completed, unattempted),
                other => panic!("expected PartialExecution, got {other:?}"),
            };
        assert_eq!(path, PathBuf::from("/p/.claude/commands/acc-commit.md"));
        assert_eq!(source.kind(), io::ErrorKind::StorageFull);
        assert_eq!(report.created, 1);
        assert_eq!(completed, vec![PathBuf::from("agents/reviewer.md")]);
        assert_eq!(unattempted, vec![PathBuf::from("skills/testing/SKILL.md")]);

        fs.clear_fault();
        let rerun = sync(&fs, SyncMode::Preserve).unwrap();
        assert_eq!((rerun.skipped, rerun.created), (1, 2));
    }

    #[test]
    fn unwritable_target_root_aborts_before_any_file() {
        let fs = MemoryFs::new();
        fs.fail_after(0, io::ErrorKind::PermissionDenied, |p| p == Path::new(TARGET));
        let err = sync(&fs, SyncMode::Preserve).unwrap_err();
        assert!(matches!(err, SyncError::TargetUnwritable { .. }));
        assert!(fs.writes().is_empty());
    }

    #[test]
    fn execute_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join(".claude");
        let src = source();
        let plan = plan(&src, &target, SyncMode::Preserve, &crate::fs::DiskFs);
        let report = execute(&plan, &src, &crate::fs::DiskFs).unwrap();
        assert_eq!(report.created, 3);
        assert_eq!(
            std::fs::read(target.join("commands/acc-commit.md")).unwrap(),
            b"commit\r\n"
        );
    }
}
