use crate::output::print_json;
use acc_core::{fs::DiskFs, paths, upgrade, SourceSpec};
use anyhow::Context;
use std::path::Path;

/// `acc install`: add missing components without touching existing files.
pub fn run(root: &Path, source: &SourceSpec, json: bool) -> anyhow::Result<()> {
    let target = paths::target_root(root);
    let tree = source.load().context("failed to load components")?;
    let report = upgrade::install(&tree, &target, &DiskFs)
        .with_context(|| format!("failed to install components into {}", target.display()))?;

    if json {
        print_json(&report)?;
    } else {
        println!(
            "Installed {} components from {} in {}: {} created, {} already present.",
            report.total(),
            tree.root().display(),
            target.display(),
            report.created,
            report.skipped
        );
    }
    Ok(())
}
