mod cmd;
mod output;
mod root;

use acc_core::{SourceSpec, SyncError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "acc",
    about = "Install and upgrade bundled commands, agents and skills in a project's .claude/ directory",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .claude/ or .git/)
    #[arg(long, global = true, env = "ACC_ROOT")]
    root: Option<PathBuf>,

    /// Component tree to sync from (default: the bundle built into this binary)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add missing components; never modifies existing files
    Install,

    /// Overwrite every bundled component, backing up changed files first
    Upgrade {
        /// Show what would happen without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Entry point for package-manager install/update scripts (never fails the host)
    Hook {
        /// Lifecycle event name, e.g. post-install-cmd or post-update-cmd
        event: Option<String>,

        /// Read a JSON event payload from a file ("-" for stdin). An explicit
        /// --root/ACC_ROOT or --source takes precedence over the payload.
        #[arg(long, conflicts_with = "event")]
        payload: Option<String>,
    },

    /// List backups taken by previous upgrades
    Backups,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let overrides = cmd::hook::Overrides {
        root: cli.root.is_some(),
        source: cli.source.map(SourceSpec::Dir),
    };
    let source = overrides.source.clone().unwrap_or(SourceSpec::Bundled);

    let result = match cli.command {
        Commands::Install => cmd::install::run(&root, &source, cli.json),
        Commands::Upgrade { dry_run } => cmd::upgrade::run(&root, &source, dry_run, cli.json),
        Commands::Hook { event, payload } => {
            cmd::hook::run(&root, &overrides, event.as_deref(), payload.as_deref(), cli.json)
        }
        Commands::Backups => cmd::backups::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        let sync_err = e.chain().find_map(|c| c.downcast_ref::<SyncError>());
        if let Some(err) = sync_err {
            print_partial(err);
        }
        if let Some(hint) = sync_err.and_then(SyncError::hint) {
            eprintln!("hint: {hint}");
        }
        std::process::exit(1);
    }
}

/// What a half-finished sync left behind: where the originals are and which
/// files were and were not written.
fn print_partial(err: &SyncError) {
    let SyncError::PartialExecution {
        report,
        completed,
        unattempted,
        ..
    } = err
    else {
        return;
    };
    match &report.backup {
        Some(backup) => eprintln!("backup: {}", backup.display()),
        None => eprintln!("backup: none taken (no existing file was due to be overwritten)"),
    }
    for path in completed {
        eprintln!("  completed:   {}", path.display());
    }
    for path in unattempted {
        eprintln!("  unattempted: {}", path.display());
    }
}
