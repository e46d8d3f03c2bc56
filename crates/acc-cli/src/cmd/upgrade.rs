use super::{category_rows, CATEGORY_HEADERS};
use crate::output::{print_json, print_table};
use acc_core::plan::{plan, SyncMode};
use acc_core::{fs::DiskFs, paths, upgrade, SourceSpec};
use anyhow::Context;
use std::path::Path;

/// `acc upgrade`: back up and overwrite every bundled component.
pub fn run(root: &Path, source: &SourceSpec, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let target = paths::target_root(root);
    let tree = source.load().context("failed to load components")?;

    if dry_run {
        let plan = plan(&tree, &target, SyncMode::Force, &DiskFs);
        if json {
            return print_json(&plan);
        }
        println!(
            "Upgrade plan for {}: {} files from {} (nothing written)",
            target.display(),
            tree.len(),
            tree.root().display()
        );
        let rows = plan
            .entries
            .iter()
            .map(|e| vec![e.action.to_string(), e.path.display().to_string()])
            .collect();
        print_table(&["ACTION", "PATH"], rows);
        if plan.has_overwrites() {
            println!("\nA backup of the overwritten files would be taken first.");
        }
        return Ok(());
    }

    let report = upgrade::upgrade(&tree, &target, &DiskFs)
        .with_context(|| format!("failed to upgrade components in {}", target.display()))?;

    if json {
        return print_json(&report);
    }

    println!("Upgraded components in: {}", target.display());
    match &report.backup {
        Some(backup) => println!("  backup: {}", backup.display()),
        None => println!("  backup: none (no existing files were overwritten)"),
    }
    println!();
    print_table(&CATEGORY_HEADERS, category_rows(&report));
    println!(
        "\n{} files from {}: {} created, {} overwritten.",
        report.total(),
        tree.root().display(),
        report.created,
        report.overwritten
    );
    Ok(())
}
