//! Cluster-level reconciliation: one cluster against one definition.

use std::collections::BTreeSet;

use confsync_core::{Cluster, Setting};

use crate::definition::SettingDefinition;
use crate::events::{EventSink, ReconEvent};
use crate::policy::{ChangeContext, ConfirmationPolicy, OperationKind};
use crate::validator::{sanitize, validate};

/// Per-cluster tally of applied and declined operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterOutcome {
    pub inserts_applied: usize,
    pub inserts_declined: usize,
    pub updates_applied: usize,
    pub updates_declined: usize,
    pub deletes_applied: usize,
    pub deletes_declined: usize,
}

impl ClusterOutcome {
    pub fn applied(&self) -> usize {
        self.inserts_applied + self.updates_applied + self.deletes_applied
    }

    pub fn declined(&self) -> usize {
        self.inserts_declined + self.updates_declined + self.deletes_declined
    }

    /// True when nothing was proposed at all.
    pub fn is_clean(&self) -> bool {
        self.applied() == 0 && self.declined() == 0
    }
}

/// Bring one cluster in line with its definition.
///
/// Single pass in definition order: a missing key is an insert candidate, a
/// present-but-invalid value is an update candidate. Keys the definition
/// does not mention are delete candidates afterwards.
///
/// A present key is considered the moment it is validated, whether or not
/// the update is confirmed; a declined update therefore never resurfaces as
/// a delete candidate. Mutates the cluster only; persistence is the
/// caller's job.
pub fn reconcile_cluster(
    cluster: &mut Cluster,
    hive_name: &str,
    definition: &SettingDefinition,
    policy: &mut dyn ConfirmationPolicy,
    sink: &mut dyn EventSink,
) -> ClusterOutcome {
    let mut outcome = ClusterOutcome::default();
    let mut remaining: BTreeSet<String> = cluster.settings.keys().cloned().collect();

    for node in &definition.settings {
        match cluster.settings.get(&node.key).cloned() {
            None => {
                let ctx = ChangeContext {
                    hive: hive_name.to_string(),
                    cluster: Some(cluster.name.clone()),
                    setting: Some(node.key.clone()),
                    current: None,
                    proposed: Some(node.default.to_string()),
                    reason: "missing from cluster".to_string(),
                };
                sink.emit(ReconEvent::OperationProposed {
                    kind: OperationKind::Insert,
                    ctx: ctx.clone(),
                });
                if policy.confirm(OperationKind::Insert, &ctx) {
                    cluster.set(Setting::new(node.key.clone(), node.default.clone()));
                    outcome.inserts_applied += 1;
                    sink.emit(ReconEvent::OperationApplied {
                        kind: OperationKind::Insert,
                        ctx,
                    });
                } else {
                    outcome.inserts_declined += 1;
                    sink.emit(ReconEvent::OperationDeclined {
                        kind: OperationKind::Insert,
                        ctx,
                    });
                }
            }
            Some(setting) => {
                let verdict = validate(node, &setting);
                if !verdict.valid {
                    let fixed = sanitize(node, &setting);
                    let ctx = ChangeContext {
                        hive: hive_name.to_string(),
                        cluster: Some(cluster.name.clone()),
                        setting: Some(node.key.clone()),
                        current: Some(setting.value.to_string()),
                        proposed: Some(fixed.value.to_string()),
                        reason: verdict.message,
                    };
                    sink.emit(ReconEvent::OperationProposed {
                        kind: OperationKind::Update,
                        ctx: ctx.clone(),
                    });
                    if policy.confirm(OperationKind::Update, &ctx) {
                        cluster.set(fixed);
                        outcome.updates_applied += 1;
                        sink.emit(ReconEvent::OperationApplied {
                            kind: OperationKind::Update,
                            ctx,
                        });
                    } else {
                        outcome.updates_declined += 1;
                        sink.emit(ReconEvent::OperationDeclined {
                            kind: OperationKind::Update,
                            ctx,
                        });
                    }
                }
                // Considered, confirmed or not: a declined update must not
                // turn into a delete candidate below.
                remaining.remove(&node.key);
            }
        }
    }

    for key in remaining {
        let ctx = ChangeContext {
            hive: hive_name.to_string(),
            cluster: Some(cluster.name.clone()),
            setting: Some(key.clone()),
            current: cluster.setting(&key).map(|s| s.value.to_string()),
            proposed: None,
            reason: "not present in definition".to_string(),
        };
        sink.emit(ReconEvent::OperationProposed {
            kind: OperationKind::Delete,
            ctx: ctx.clone(),
        });
        if policy.confirm(OperationKind::Delete, &ctx) {
            cluster.remove(&key);
            outcome.deletes_applied += 1;
            sink.emit(ReconEvent::OperationApplied {
                kind: OperationKind::Delete,
                ctx,
            });
        } else {
            outcome.deletes_declined += 1;
            sink.emit(ReconEvent::OperationDeclined {
                kind: OperationKind::Delete,
                ctx,
            });
        }
    }

    outcome
}
