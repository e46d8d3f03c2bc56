use crate::output::print_json;
use acc_core::fs::DiskFs;
use acc_core::hook::{self, HookOutcome, LifecycleEvent, SyncRequest};
use acc_core::report::UpgradeReport;
use acc_core::{paths, SourceSpec};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Global options the user set explicitly. They win over a hook payload.
pub struct Overrides {
    /// `--root` or `ACC_ROOT` was given.
    pub root: bool,
    pub source: Option<SourceSpec>,
}

#[derive(Serialize)]
struct HookJson<'a> {
    synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a UpgradeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'a str>,
}

/// `acc hook`: preserve-mode sync for package-manager scripts.
///
/// Problems are reported as warnings and the command still succeeds, so a
/// broken component sync never fails the host's dependency install.
pub fn run(
    root: &Path,
    overrides: &Overrides,
    event: Option<&str>,
    payload: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let (event, request) = match resolve(root, overrides, event, payload) {
        Ok(resolved) => resolved,
        Err(message) => {
            let message = format!("component sync skipped: {message}");
            tracing::warn!("{message}");
            return degraded(&message, json);
        }
    };

    match hook::on_lifecycle_event(event, &request, &DiskFs) {
        HookOutcome::Synced(report) => {
            if json {
                print_json(&HookJson {
                    synced: true,
                    report: Some(&report),
                    warning: None,
                })?;
            } else if report.created > 0 {
                println!(
                    "acc: added {} component file(s) to {}",
                    report.created,
                    request.target_root.display()
                );
            }
            Ok(())
        }
        // Already logged as a warning.
        HookOutcome::Degraded(message) => degraded(&message, json),
    }
}

fn degraded(message: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&HookJson {
            synced: false,
            report: None,
            warning: Some(message),
        })?;
    }
    Ok(())
}

fn resolve(
    root: &Path,
    overrides: &Overrides,
    event: Option<&str>,
    payload: Option<&str>,
) -> Result<(LifecycleEvent, SyncRequest), String> {
    if let Some(payload) = payload {
        let json = read_payload(payload)
            .map_err(|e| format!("cannot read event payload {payload}: {e}"))?;
        let (event, mut request) = hook::parse_event(&json).map_err(|e| e.to_string())?;
        if overrides.root {
            request.target_root = paths::target_root(root);
        }
        if let Some(source) = &overrides.source {
            request.source = source.clone();
        }
        return Ok((event, request));
    }

    let event = event
        .ok_or_else(|| "no lifecycle event given".to_string())?
        .parse::<LifecycleEvent>()?;
    let source = overrides.source.clone().unwrap_or(SourceSpec::Bundled);
    Ok((event, SyncRequest::for_project(source, root)))
}

fn read_payload(arg: &str) -> std::io::Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(arg)
    }
}
