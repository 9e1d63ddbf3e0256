//! `confsync hives`: list what the store currently holds.

use std::path::Path;

use confsync_core::SettingStore;
use confsync_store::SqliteStore;

use crate::exit_codes::{EXIT_ERROR, EXIT_STORE};
use crate::{cli_err, CliError};

pub fn cmd_hives(store_path: &Path, json: bool) -> Result<(), CliError> {
    let store = SqliteStore::open(store_path).map_err(|e| {
        cli_err(
            EXIT_STORE,
            format!("cannot open {}: {e}", store_path.display()),
        )
    })?;
    let hives = store
        .load_all_hives()
        .map_err(|e| cli_err(EXIT_STORE, e.to_string()))?;

    if json {
        let json_str = serde_json::to_string_pretty(&hives)
            .map_err(|e| cli_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    if hives.is_empty() {
        eprintln!("store is empty");
        return Ok(());
    }

    for hive in &hives {
        println!(
            "hive '{}'{}",
            hive.name,
            if hive.defined_at_hive {
                " (shared definition)"
            } else {
                ""
            }
        );
        for cluster in &hive.clusters {
            println!("  cluster '{}': {} setting(s)", cluster.name, cluster.settings.len());
            for setting in cluster.settings.values() {
                println!("    {} = {}", setting.name, setting.value);
            }
        }
    }
    Ok(())
}
