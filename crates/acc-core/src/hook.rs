//! Package-manager lifecycle boundary.
//!
//! Host tools (Composer scripts, npm hooks, CI steps) call in after installing
//! or updating the package. Whatever shape their event has, it is reduced to a
//! [`SyncRequest`] before the core is involved, and the sync always runs in
//! preserve mode. Failures are logged and swallowed so the host's own install
//! keeps going.

use crate::error::{Result, SyncError};
use crate::fs::Fs;
use crate::paths;
use crate::report::UpgradeReport;
use crate::source::SourceSpec;
use crate::upgrade;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Install,
    Update,
}

impl FromStr for LifecycleEvent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "install" | "post-install-cmd" | "post-package-install" => Ok(LifecycleEvent::Install),
            "update" | "post-update-cmd" | "post-package-update" => Ok(LifecycleEvent::Update),
            other => Err(format!("unsupported lifecycle event: {other}")),
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::Install => f.write_str("install"),
            LifecycleEvent::Update => f.write_str("update"),
        }
    }
}

/// The only thing the core needs from a host event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub source: SourceSpec,
    pub target_root: PathBuf,
}

impl SyncRequest {
    pub fn for_project(source: SourceSpec, project_root: &std::path::Path) -> Self {
        Self {
            source,
            target_root: paths::target_root(project_root),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(alias = "name", alias = "event_name")]
    event: String,
    #[serde(default)]
    package: Option<PackagePayload>,
    #[serde(alias = "root", alias = "projectRoot")]
    project_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PackagePayload {
    #[serde(alias = "installPath", alias = "path")]
    install_path: PathBuf,
}

/// Reduce a JSON host event to `(event, request)`.
///
/// The payload needs an event name and a project root; `package.install_path`
/// is optional and points at an installed package whose `components/`
/// directory is the source. Without it the bundled tree is used.
pub fn parse_event(json: &str) -> Result<(LifecycleEvent, SyncRequest)> {
    let payload: EventPayload =
        serde_json::from_str(json).map_err(|e| SyncError::InvalidEvent(e.to_string()))?;
    let event = payload
        .event
        .parse::<LifecycleEvent>()
        .map_err(SyncError::InvalidEvent)?;
    let source = match payload.package {
        Some(pkg) => SourceSpec::Dir(pkg.install_path.join(paths::COMPONENTS_DIR)),
        None => SourceSpec::Bundled,
    };
    Ok((event, SyncRequest::for_project(source, &payload.project_root)))
}

#[derive(Debug)]
pub enum HookOutcome {
    Synced(UpgradeReport),
    /// The sync failed; the message has already been logged as a warning.
    Degraded(String),
}

impl HookOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, HookOutcome::Synced(_))
    }
}

/// Run a preserve-mode sync for a lifecycle event. Never fails.
pub fn on_lifecycle_event(event: LifecycleEvent, request: &SyncRequest, fs: &dyn Fs) -> HookOutcome {
    let result = request
        .source
        .load()
        .and_then(|source| upgrade::install(&source, &request.target_root, fs));

    match result {
        Ok(report) => {
            tracing::debug!(
                %event,
                target = %request.target_root.display(),
                created = report.created,
                skipped = report.skipped,
                "components synced"
            );
            HookOutcome::Synced(report)
        }
        Err(err) => {
            let mut message = format!("component sync skipped after {event}: {err}");
            if let Some(hint) = err.hint() {
                message.push_str(&format!(" ({hint})"));
            }
            tracing::warn!(%event, target = %request.target_root.display(), "{message}");
            HookOutcome::Degraded(message)
        }
    }
}
