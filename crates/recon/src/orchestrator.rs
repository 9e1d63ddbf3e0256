//! Top-level reconciliation: all definitions against the whole store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use confsync_core::{Hive, SettingStore};

use crate::cluster::reconcile_cluster;
use crate::definition::SettingDefinition;
use crate::events::{EventSink, ReconEvent};
use crate::hive::reconcile_definition;
use crate::policy::ConfirmationPolicy;
use crate::report::{CommitFailure, ReconReport, SkipEntry};

/// Cooperative cancellation flag. Cloned tokens share the flag.
///
/// The orchestrator checks it at hive and cluster boundaries. Hives
/// committed before cancellation stay applied; a cancelled in-flight hive is
/// rolled back in full.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Run a full reconciliation pass.
///
/// Phase one ensures every definition's hive and cluster exist (committed as
/// one unit). Phase two walks every stored hive, resolves the definition
/// applying to each cluster, reconciles it, and commits hive by hive. A
/// failed hive commit is reported and does not block later hives.
///
/// The store is the single source of truth and the run assumes exclusive
/// access to it; callers must not run two passes concurrently.
pub fn run(
    definitions: &[SettingDefinition],
    store: &mut dyn SettingStore,
    policy: &mut dyn ConfirmationPolicy,
    sink: &mut dyn EventSink,
    cancel: &CancelToken,
) -> ReconReport {
    let mut report = ReconReport::new();
    sink.emit(ReconEvent::RunStarted {
        definitions: definitions.len(),
    });

    // Phase one: existence. Hive/cluster creation precedes any
    // setting-level reconciliation.
    for definition in definitions {
        if cancel.is_cancelled() {
            report.cancelled = true;
            let _ = store.rollback();
            return finish(report, sink);
        }
        match reconcile_definition(definition, store, policy, sink) {
            Ok(outcome) => {
                report.inserts.applied += outcome.hives_created + outcome.clusters_created;
                report.inserts.declined += outcome.declined;
            }
            Err(e) => report.skipped.push(SkipEntry {
                subject: definition.display_name(),
                reason: e.to_string(),
            }),
        }
    }
    if let Err(e) = store.commit() {
        // Without durable hives and clusters there is nothing safe to
        // reconcile settings against.
        report.commit_failures.push(CommitFailure {
            hive: "(existence pass)".to_string(),
            error: e.to_string(),
        });
        let _ = store.rollback();
        return finish(report, sink);
    }

    // Phase two: settings, hive by hive.
    let hives = match store.load_all_hives() {
        Ok(hives) => hives,
        Err(e) => {
            report.skipped.push(SkipEntry {
                subject: "(store)".to_string(),
                reason: e.to_string(),
            });
            return finish(report, sink);
        }
    };

    for hive in &hives {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        sink.emit(ReconEvent::HiveStarted {
            hive: hive.name.clone(),
            clusters: hive.clusters.len(),
        });

        let mut applied_in_hive = 0usize;
        let mut hive_cancelled = false;
        let mut hive_failed = false;

        let mut clusters = hive.clusters.clone();
        for cluster in &mut clusters {
            if cancel.is_cancelled() {
                hive_cancelled = true;
                break;
            }
            let Some(definition) = resolve_definition(definitions, hive, &cluster.name) else {
                let reason = if hive.defined_at_hive {
                    format!("no hive-scoped definition for hive '{}'", hive.name)
                } else {
                    format!(
                        "no cluster-scoped definition for '{}/{}'",
                        hive.name, cluster.name
                    )
                };
                report.skipped.push(SkipEntry {
                    subject: format!("{}/{}", hive.name, cluster.name),
                    reason: reason.clone(),
                });
                sink.emit(ReconEvent::ClusterSkipped {
                    hive: hive.name.clone(),
                    cluster: cluster.name.clone(),
                    reason,
                });
                continue;
            };

            let outcome = reconcile_cluster(cluster, &hive.name, definition, policy, sink);
            report.absorb(&outcome);
            applied_in_hive += outcome.applied();

            if outcome.applied() > 0 {
                if let Err(e) = store.persist(cluster) {
                    let _ = store.rollback();
                    report.commit_failures.push(CommitFailure {
                        hive: hive.name.clone(),
                        error: e.to_string(),
                    });
                    sink.emit(ReconEvent::HiveCommitFailed {
                        hive: hive.name.clone(),
                        error: e.to_string(),
                    });
                    hive_failed = true;
                    break;
                }
            }
        }

        if hive_cancelled {
            // Fully discard the in-flight hive: the commit boundary promises
            // all-or-nothing per hive.
            let _ = store.rollback();
            report.cancelled = true;
            break;
        }
        if hive_failed {
            continue;
        }

        match store.commit() {
            Ok(()) => {
                report.hives_committed += 1;
                sink.emit(ReconEvent::HiveCommitted {
                    hive: hive.name.clone(),
                    applied: applied_in_hive,
                });
            }
            Err(e) => {
                let _ = store.rollback();
                report.commit_failures.push(CommitFailure {
                    hive: hive.name.clone(),
                    error: e.to_string(),
                });
                sink.emit(ReconEvent::HiveCommitFailed {
                    hive: hive.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    // Definitions that matched nothing in the store (external deletion race,
    // or a creation declined above) are skipped reconciliations, not errors.
    if !report.cancelled {
        for definition in definitions {
            let matched = match definition.scope.cluster_key() {
                None => hives.iter().any(|h| h.name == definition.hive),
                Some(key) => hives
                    .iter()
                    .any(|h| h.name == definition.hive && h.cluster(key).is_some()),
            };
            if !matched {
                report.skipped.push(SkipEntry {
                    subject: definition.display_name(),
                    reason: "no matching hive or cluster in store".to_string(),
                });
            }
        }
    }

    finish(report, sink)
}

fn finish(report: ReconReport, sink: &mut dyn EventSink) -> ReconReport {
    sink.emit(ReconEvent::RunCompleted {
        applied: report.applied(),
        declined: report.declined(),
    });
    report
}

/// Pick the definition that applies to `cluster` under `hive`.
///
/// `defined_at_hive` hives share one hive-scoped definition; otherwise each
/// cluster needs its own cluster-scoped definition.
fn resolve_definition<'a>(
    definitions: &'a [SettingDefinition],
    hive: &Hive,
    cluster: &str,
) -> Option<&'a SettingDefinition> {
    if hive.defined_at_hive {
        definitions
            .iter()
            .find(|d| d.hive == hive.name && d.scope.is_hive())
    } else {
        definitions
            .iter()
            .find(|d| d.hive == hive.name && d.scope.cluster_key() == Some(cluster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confsync_core::{HiveId, Setting};
    use confsync_store::MemoryStore;
    use crate::events::EventCollector;
    use crate::policy::{DeclineAll, ForcedPolicy};

    fn definitions() -> Vec<SettingDefinition> {
        vec![SettingDefinition::from_toml(
            r#"
hive = "app"

[[settings]]
key = "timeout"
default = 30
"#,
        )
        .unwrap()]
    }

    #[test]
    fn pre_cancelled_run_changes_nothing() {
        let mut store = MemoryStore::new();
        let mut policy = ForcedPolicy::all();
        let mut sink = EventCollector::new();
        let cancel = CancelToken::new();
        cancel.cancel();

        let report = run(
            &definitions(),
            &mut store,
            &mut policy,
            &mut sink,
            &cancel,
        );
        assert!(report.cancelled);
        assert_eq!(report.applied(), 0);
        assert!(store.load_all_hives().unwrap().is_empty());
    }

    #[test]
    fn hive_without_definition_is_skipped_not_fatal() {
        let mut store = MemoryStore::new();
        let hive = store.create_hive("orphaned", None, true).unwrap();
        assert_eq!(hive.id, HiveId(1));
        store.create_cluster("orphaned", "c1").unwrap();
        store.commit().unwrap();

        let mut policy = ForcedPolicy::all();
        let mut sink = EventCollector::new();
        let report = run(
            &definitions(),
            &mut store,
            &mut policy,
            &mut sink,
            &CancelToken::new(),
        );

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].subject, "orphaned/c1");
        // The definition's own hive was still created and committed.
        assert!(store.hive_exists("app").unwrap());
    }

    #[test]
    fn declined_hive_creation_leaves_definition_skipped() {
        let mut store = MemoryStore::new();
        let mut policy = DeclineAll;
        let mut sink = EventCollector::new();

        let report = run(
            &definitions(),
            &mut store,
            &mut policy,
            &mut sink,
            &CancelToken::new(),
        );

        // The hive insert was declined, so the definition had nothing to
        // reconcile against.
        assert_eq!(report.inserts.declined, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].subject, "app");
    }

    #[test]
    fn resolve_prefers_matching_scope() {
        let defs = vec![
            SettingDefinition::from_toml("hive = \"a\"\n").unwrap(),
            SettingDefinition::from_toml(
                "hive = \"b\"\nscope = \"cluster\"\ncluster = \"c1\"\n",
            )
            .unwrap(),
        ];

        let shared = Hive {
            id: HiveId(1),
            name: "a".into(),
            parent: None,
            defined_at_hive: true,
            clusters: vec![],
        };
        assert!(resolve_definition(&defs, &shared, "anything").is_some());

        let per_cluster = Hive {
            id: HiveId(2),
            name: "b".into(),
            parent: None,
            defined_at_hive: false,
            clusters: vec![],
        };
        assert!(resolve_definition(&defs, &per_cluster, "c1").is_some());
        assert!(resolve_definition(&defs, &per_cluster, "c2").is_none());
    }

    #[test]
    fn phase_one_commit_is_durable_before_settings() {
        let mut store = MemoryStore::new();
        store.create_hive("app", None, true).unwrap();
        let mut cluster = store.create_cluster("app", "primary").unwrap();
        cluster.set(Setting::new("stale", 1));
        store.persist(&cluster).unwrap();
        store.commit().unwrap();

        let mut policy = ForcedPolicy::all();
        let mut sink = EventCollector::new();
        let report = run(
            &definitions(),
            &mut store,
            &mut policy,
            &mut sink,
            &CancelToken::new(),
        );

        assert_eq!(report.inserts.applied, 1); // timeout
        assert_eq!(report.deletes.applied, 1); // stale
        assert_eq!(report.hives_committed, 1);

        let hives = store.load_all_hives().unwrap();
        let keys: Vec<&str> = hives[0].clusters[0].keys().collect();
        assert_eq!(keys, vec!["timeout"]);
    }
}
