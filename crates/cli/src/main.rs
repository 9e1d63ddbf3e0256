// confsync CLI - reconcile declarative settings definitions against a
// persisted settings store (hives -> clusters -> settings).

mod exit_codes;
mod inspect;
mod prompt;
mod reconcile;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use confsync_config::Settings;
use confsync_recon::ForceFlags;
use reconcile::ReconcileArgs;

/// Structured CLI failure: message plus the exit code it maps to.
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

pub fn cli_err(code: u8, message: impl Into<String>) -> CliError {
    CliError {
        code,
        message: message.into(),
        hint: None,
    }
}

#[derive(Parser)]
#[command(name = "confsync")]
#[command(about = "Reconcile settings definitions against a settings store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the store against the definitions directory
    #[command(after_help = "\
Exit code 3 indicates unresolved differences: declined proposals or skipped
definitions. A dry run therefore exits 3 whenever changes would be made.

Examples:
  confsync reconcile
  confsync reconcile --force
  confsync reconcile --definitions ./defs --store ./store.db --force-insert
  confsync reconcile --dry-run --json
  confsync reconcile --force --json --output report.json")]
    Reconcile {
        /// Directory containing definition TOML files
        #[arg(long, value_name = "DIR")]
        definitions: Option<PathBuf>,

        /// Path to the settings store database
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Apply inserts without prompting
        #[arg(long)]
        force_insert: bool,

        /// Apply updates without prompting
        #[arg(long)]
        force_update: bool,

        /// Apply deletes without prompting
        #[arg(long)]
        force_delete: bool,

        /// Apply every operation class without prompting
        #[arg(long, conflicts_with = "dry_run")]
        force: bool,

        /// Propose only; decline every operation
        #[arg(long)]
        dry_run: bool,

        /// Output the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Suppress progress output
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Validate definition files without touching the store
    #[command(after_help = "\
Examples:
  confsync validate
  confsync validate --definitions ./defs")]
    Validate {
        /// Directory containing definition TOML files
        #[arg(long, value_name = "DIR")]
        definitions: Option<PathBuf>,
    },

    /// Show the definition resolved for a hive or cluster
    #[command(after_help = "\
Examples:
  confsync show app
  confsync show jobs nightly")]
    Show {
        /// Hive name
        hive: String,

        /// Cluster name (cluster-scoped definitions take precedence)
        cluster: Option<String>,

        /// Directory containing definition TOML files
        #[arg(long, value_name = "DIR")]
        definitions: Option<PathBuf>,
    },

    /// List hives, clusters and settings in the store
    Hives {
        /// Path to the settings store database
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Output JSON instead of the human listing
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = Settings::load();

    let result = match cli.command {
        Commands::Reconcile {
            definitions,
            store,
            force_insert,
            force_update,
            force_delete,
            force,
            dry_run,
            json,
            output,
            quiet,
        } => {
            let force = ForceFlags {
                insert: force || force_insert || settings.force_insert,
                update: force || force_update || settings.force_update,
                delete: force || force_delete || settings.force_delete,
            };
            reconcile::cmd_reconcile(ReconcileArgs {
                definitions: definitions.unwrap_or_else(|| settings.effective_definitions_dir()),
                store: store.unwrap_or_else(|| settings.effective_store_path()),
                force,
                dry_run,
                json,
                output,
                quiet: quiet || settings.quiet,
            })
        }
        Commands::Validate { definitions } => reconcile::cmd_validate(
            &definitions.unwrap_or_else(|| settings.effective_definitions_dir()),
        ),
        Commands::Show {
            hive,
            cluster,
            definitions,
        } => reconcile::cmd_show(
            &definitions.unwrap_or_else(|| settings.effective_definitions_dir()),
            &hive,
            cluster.as_deref(),
        ),
        Commands::Hives { store, json } => inspect::cmd_hives(
            &store.unwrap_or_else(|| settings.effective_store_path()),
            json,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = e.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(e.code)
        }
    }
}
