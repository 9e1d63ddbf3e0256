//! `confsync reconcile` / `validate` / `show`: definition-driven commands.

use std::path::{Path, PathBuf};

use confsync_recon::{
    run, CancelToken, ConfirmationPolicy, DeclineAll, DefinitionSource, ForceFlags, SkipEntry,
};
use confsync_config::DirectorySource;
use confsync_store::SqliteStore;

use crate::exit_codes::{EXIT_ERROR, EXIT_INVALID_DEFINITION, EXIT_STORE, EXIT_UNRESOLVED};
use crate::prompt::PromptPolicy;
use crate::render::StderrSink;
use crate::{cli_err, CliError};

pub struct ReconcileArgs {
    pub definitions: PathBuf,
    pub store: PathBuf,
    pub force: ForceFlags,
    pub dry_run: bool,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub quiet: bool,
}

pub fn cmd_reconcile(args: ReconcileArgs) -> Result<(), CliError> {
    let source = DirectorySource::new(&args.definitions);
    let loaded = source
        .load_all()
        .map_err(|e| cli_err(EXIT_ERROR, e.to_string()))?;

    let mut store = SqliteStore::open(&args.store).map_err(|e| {
        cli_err(
            EXIT_STORE,
            format!("cannot open {}: {e}", args.store.display()),
        )
    })?;

    let mut policy: Box<dyn ConfirmationPolicy> = if args.dry_run {
        Box::new(DeclineAll)
    } else {
        Box::new(PromptPolicy::new(args.force))
    };
    let mut sink = StderrSink { quiet: args.quiet };
    let cancel = CancelToken::new();

    let mut report = run(
        &loaded.definitions,
        &mut store,
        policy.as_mut(),
        &mut sink,
        &cancel,
    );

    // Fold definition-load failures into the report's skip list.
    for skip in loaded.skipped {
        report.skipped.push(SkipEntry {
            subject: skip.source,
            reason: skip.reason,
        });
    }

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| cli_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_str)
            .map_err(|e| cli_err(EXIT_ERROR, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        println!("{json_str}");
    }

    // Human summary to stderr
    eprintln!(
        "{} applied, {} declined, {} skipped, {} hive(s) committed",
        report.applied(),
        report.declined(),
        report.skipped.len(),
        report.hives_committed,
    );

    if !report.commit_failures.is_empty() {
        return Err(cli_err(
            EXIT_STORE,
            format!("{} hive commit(s) failed", report.commit_failures.len()),
        ));
    }
    if report.unresolved() > 0 || !report.skipped.is_empty() {
        return Err(cli_err(EXIT_UNRESOLVED, "unresolved differences remain"));
    }
    Ok(())
}

pub fn cmd_validate(definitions: &Path) -> Result<(), CliError> {
    let source = DirectorySource::new(definitions);
    let loaded = source
        .load_all()
        .map_err(|e| cli_err(EXIT_ERROR, e.to_string()))?;

    for definition in &loaded.definitions {
        eprintln!(
            "valid: {} ({} scope, {} setting(s))",
            definition.display_name(),
            if definition.scope.is_hive() {
                "hive"
            } else {
                "cluster"
            },
            definition.settings.len(),
        );
    }
    for skip in &loaded.skipped {
        eprintln!("invalid: {}: {}", skip.source, skip.reason);
    }

    if !loaded.skipped.is_empty() {
        return Err(cli_err(
            EXIT_INVALID_DEFINITION,
            format!("{} invalid definition file(s)", loaded.skipped.len()),
        ));
    }
    if loaded.definitions.is_empty() {
        return Err(cli_err(EXIT_ERROR, "no definition files found"));
    }
    Ok(())
}

pub fn cmd_show(definitions: &Path, hive: &str, cluster: Option<&str>) -> Result<(), CliError> {
    let source = DirectorySource::new(definitions);
    let resolved = source
        .load_for(hive, cluster)
        .map_err(|e| cli_err(EXIT_ERROR, e.to_string()))?;

    let Some(definition) = resolved else {
        let target = match cluster {
            Some(cluster) => format!("{hive}/{cluster}"),
            None => hive.to_string(),
        };
        return Err(cli_err(
            EXIT_ERROR,
            format!("no definition found for '{target}'"),
        ));
    };

    println!(
        "{} ({} scope)",
        definition.display_name(),
        if definition.scope.is_hive() {
            "hive"
        } else {
            "cluster"
        }
    );
    for node in &definition.settings {
        println!(
            "  {} = {} [{}]",
            node.key,
            node.default,
            node.rule.describe()
        );
    }
    Ok(())
}
