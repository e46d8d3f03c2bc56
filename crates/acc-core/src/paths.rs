use crate::error::{Result, SyncError};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CLAUDE_DIR: &str = ".claude";
pub const COMMANDS_DIR: &str = "commands";
pub const AGENTS_DIR: &str = "agents";
pub const SKILLS_DIR: &str = "skills";

/// Directory inside an installed package that holds the component tree.
pub const COMPONENTS_DIR: &str = "components";

pub const BACKUP_INFIX: &str = ".backup-";
pub const STAGING_SUFFIX: &str = ".partial";

/// `chrono` format for backup directory timestamps (second resolution, UTC).
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `.claude/` directory of a project.
pub fn target_root(project_root: &Path) -> PathBuf {
    project_root.join(CLAUDE_DIR)
}

/// Directory that backups of `target_root` are written next to.
pub fn backup_parent(target_root: &Path) -> PathBuf {
    match target_root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn target_name(target_root: &Path) -> String {
    target_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| CLAUDE_DIR.to_string())
}

/// Sibling backup directory for `target_root`: `<name>.backup-<stamp>[-N]`.
/// A `counter` of zero means no suffix.
pub fn backup_dir(target_root: &Path, stamp: &str, counter: u32) -> PathBuf {
    let mut name = format!("{}{BACKUP_INFIX}{stamp}", target_name(target_root));
    if counter > 0 {
        name.push_str(&format!("-{counter}"));
    }
    backup_parent(target_root).join(name)
}

/// Staging directory a backup is assembled in before being renamed into place.
pub fn staging_dir(backup_dir: &Path) -> PathBuf {
    let mut name = backup_dir.as_os_str().to_os_string();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

/// If `name` is a completed backup of `target_root`, return its
/// `(timestamp, counter)`.
pub fn parse_backup_name(target_root: &Path, name: &str) -> Option<(String, u32)> {
    static BACKUP_RE: OnceLock<Regex> = OnceLock::new();
    let re = BACKUP_RE.get_or_init(|| {
        Regex::new(r"^(?P<target>.+)\.backup-(?P<stamp>\d{8}-\d{6})(?:-(?P<n>\d+))?$")
            .expect("backup name pattern is valid")
    });
    let caps = re.captures(name)?;
    if &caps["target"] != target_name(target_root).as_str() {
        return None;
    }
    let counter = match caps.name("n") {
        Some(n) => n.as_str().parse().ok()?,
        None => 0,
    };
    Some((caps["stamp"].to_string(), counter))
}

// ---------------------------------------------------------------------------
// Component paths
// ---------------------------------------------------------------------------

/// Reject anything that is not a plain relative path inside the tree.
pub fn validate_relative(path: &Path) -> Result<()> {
    let mut normal = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            _ => return Err(SyncError::InvalidSourcePath(path.to_path_buf())),
        }
    }
    if normal == 0 {
        return Err(SyncError::InvalidSourcePath(path.to_path_buf()));
    }
    Ok(())
}

/// Strip `.` components so equal paths compare equal.
pub fn normalize_relative(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_dir_is_sibling() {
        let root = Path::new("/tmp/proj/.claude");
        assert_eq!(
            backup_dir(root, "20261016-101500", 0),
            PathBuf::from("/tmp/proj/.claude.backup-20261016-101500")
        );
        assert_eq!(
            backup_dir(root, "20261016-101500", 2),
            PathBuf::from("/tmp/proj/.claude.backup-20261016-101500-2")
        );
        assert_eq!(
            staging_dir(&backup_dir(root, "20261016-101500", 0)),
            PathBuf::from("/tmp/proj/.claude.backup-20261016-101500.partial")
        );
    }

    #[test]
    fn backup_dir_of_bare_name() {
        assert_eq!(
            backup_dir(Path::new(".claude"), "20261016-101500", 0),
            PathBuf::from("./.claude.backup-20261016-101500")
        );
    }

    #[test]
    fn parses_backup_names() {
        let root = Path::new("/tmp/proj/.claude");
        assert_eq!(
            parse_backup_name(root, ".claude.backup-20261016-101500"),
            Some(("20261016-101500".to_string(), 0))
        );
        assert_eq!(
            parse_backup_name(root, ".claude.backup-20261016-101500-3"),
            Some(("20261016-101500".to_string(), 3))
        );
        for name in [
            ".claude.backup-20261016-101500.partial",
            ".claude",
            "other.backup-20261016-101500",
            ".claude.backup-latest",
        ] {
            assert!(parse_backup_name(root, name).is_none(), "{name}");
        }
    }

    #[test]
    fn valid_relative_paths() {
        for p in ["commands/acc-commit.md", "skills/x/SKILL.md", "./agents/a.md"] {
            validate_relative(Path::new(p)).unwrap_or_else(|_| panic!("expected valid: {p}"));
        }
    }

    #[test]
    fn invalid_relative_paths() {
        for p in ["", ".", "../x.md", "commands/../../x.md", "/etc/passwd"] {
            assert!(validate_relative(Path::new(p)).is_err(), "expected invalid: {p}");
        }
    }

    #[test]
    fn normalizes_cur_dir() {
        assert_eq!(
            normalize_relative(Path::new("./commands/./a.md")),
            PathBuf::from("commands/a.md")
        );
    }
}
