pub mod backup;
pub mod bundle;
pub mod error;
pub mod fs;
pub mod hook;
pub mod io;
pub mod merge;
pub mod paths;
pub mod plan;
pub mod report;
pub mod source;
pub mod upgrade;

pub use error::{Result, SyncError};
pub use plan::{Action, CopyPlan, SyncMode};
pub use report::UpgradeReport;
pub use source::{ComponentSourceTree, SourceSpec};
