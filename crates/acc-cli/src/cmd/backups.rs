use crate::output::{print_json, print_table};
use acc_core::{backup, fs::DiskFs, paths};
use std::path::Path;

/// `acc backups`: list snapshots taken by earlier upgrades.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let target = paths::target_root(root);
    let backups = backup::list_backups(&DiskFs, &target)?;

    if json {
        return print_json(&backups);
    }
    if backups.is_empty() {
        println!("No backups found next to {}.", target.display());
        return Ok(());
    }

    let rows = backups
        .iter()
        .map(|b| {
            vec![
                b.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                b.path.display().to_string(),
            ]
        })
        .collect();
    print_table(&["CREATED", "PATH"], rows);
    Ok(())
}
