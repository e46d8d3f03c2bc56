use crate::report::UpgradeReport;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("component source unavailable: {}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid component path '{}': must be relative and stay inside the source tree", .0.display())]
    InvalidSourcePath(PathBuf),

    #[error("target not writable: {}", .path.display())]
    TargetUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("backup incomplete at {}: no target file was overwritten", .path.display())]
    BackupIncomplete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "sync stopped at {}: {} of {} entries completed, {} left unattempted",
        .path.display(),
        .completed.len(),
        .completed.len() + .unattempted.len() + 1,
        .unattempted.len()
    )]
    PartialExecution {
        path: PathBuf,
        #[source]
        source: io::Error,
        report: Box<UpgradeReport>,
        completed: Vec<PathBuf>,
        unattempted: Vec<PathBuf>,
    },

    #[error("invalid lifecycle event: {0}")]
    InvalidEvent(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SyncError {
    /// Remediation hint shown next to the error message, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        let io_err = match self {
            SyncError::SourceUnavailable { source, .. } => {
                if source.kind() == io::ErrorKind::NotFound {
                    return Some("the bundled component tree is missing; reinstall the package or pass --source <DIR>");
                }
                source
            }
            SyncError::InvalidSourcePath(_) | SyncError::InvalidEvent(_) => return None,
            SyncError::TargetUnwritable { source, .. }
            | SyncError::BackupIncomplete { source, .. }
            | SyncError::PartialExecution { source, .. } => source,
            SyncError::Io(source) => source,
        };
        let hint = match io_err.kind() {
            io::ErrorKind::PermissionDenied => "check write permissions on the project directory",
            io::ErrorKind::StorageFull => "free disk space and run the command again",
            _ => match self {
                SyncError::PartialExecution { .. } => {
                    "fix the cause and rerun; completed files are kept and the remainder will be synced"
                }
                _ => return None,
            },
        };
        Some(hint)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
