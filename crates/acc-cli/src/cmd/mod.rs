pub mod backups;
pub mod hook;
pub mod install;
pub mod upgrade;

use acc_core::report::{Category, UpgradeReport};

/// One row per category that had any activity, in display order.
pub(crate) fn category_rows(report: &UpgradeReport) -> Vec<Vec<String>> {
    [
        Category::Commands,
        Category::Agents,
        Category::Skills,
        Category::Other,
    ]
    .into_iter()
    .filter_map(|cat| {
        let counts = report.by_category.get(&cat)?;
        Some(vec![
            cat.to_string(),
            counts.created.to_string(),
            counts.overwritten.to_string(),
            counts.skipped.to_string(),
        ])
    })
    .collect()
}

pub(crate) const CATEGORY_HEADERS: [&str; 4] = ["CATEGORY", "CREATED", "OVERWRITTEN", "SKIPPED"];
