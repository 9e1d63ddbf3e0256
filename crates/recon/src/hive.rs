//! Definition-level reconciliation: make sure the hive and (for
//! cluster-scoped definitions) the cluster a definition addresses exist.

use confsync_core::SettingStore;

use crate::definition::{DefinitionScope, SettingDefinition};
use crate::error::ReconError;
use crate::events::{EventSink, ReconEvent};
use crate::policy::{ChangeContext, ConfirmationPolicy, OperationKind};

/// Tally of an existence pass over one definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExistenceOutcome {
    pub hives_created: usize,
    pub clusters_created: usize,
    pub declined: usize,
}

/// Ensure the entities a definition addresses exist, creating them under
/// confirmation.
///
/// Hive creation happens before the cluster-existence check, so a
/// just-created hive is visible to it. If hive creation is declined, the
/// cluster is not proposed either; the divergence shows up as a decline,
/// not an error.
pub fn reconcile_definition(
    definition: &SettingDefinition,
    store: &mut dyn SettingStore,
    policy: &mut dyn ConfirmationPolicy,
    sink: &mut dyn EventSink,
) -> Result<ExistenceOutcome, ReconError> {
    let mut outcome = ExistenceOutcome::default();

    if !store.hive_exists(&definition.hive)? {
        let ctx = ChangeContext {
            hive: definition.hive.clone(),
            cluster: None,
            setting: None,
            current: None,
            proposed: None,
            reason: "hive missing from store".to_string(),
        };
        sink.emit(ReconEvent::OperationProposed {
            kind: OperationKind::Insert,
            ctx: ctx.clone(),
        });
        if policy.confirm(OperationKind::Insert, &ctx) {
            store.create_hive(&definition.hive, None, definition.scope.is_hive())?;
            outcome.hives_created += 1;
            sink.emit(ReconEvent::OperationApplied {
                kind: OperationKind::Insert,
                ctx,
            });
        } else {
            outcome.declined += 1;
            sink.emit(ReconEvent::OperationDeclined {
                kind: OperationKind::Insert,
                ctx,
            });
        }
    }

    if let DefinitionScope::Cluster { key } = &definition.scope {
        // Re-check: covers both the pre-existing and the just-created hive,
        // and skips the cluster when hive creation was declined.
        if store.hive_exists(&definition.hive)? && !store.cluster_exists(&definition.hive, key)? {
            let ctx = ChangeContext {
                hive: definition.hive.clone(),
                cluster: Some(key.clone()),
                setting: None,
                current: None,
                proposed: None,
                reason: "cluster missing from store".to_string(),
            };
            sink.emit(ReconEvent::OperationProposed {
                kind: OperationKind::Insert,
                ctx: ctx.clone(),
            });
            if policy.confirm(OperationKind::Insert, &ctx) {
                store.create_cluster(&definition.hive, key)?;
                outcome.clusters_created += 1;
                sink.emit(ReconEvent::OperationApplied {
                    kind: OperationKind::Insert,
                    ctx,
                });
            } else {
                outcome.declined += 1;
                sink.emit(ReconEvent::OperationDeclined {
                    kind: OperationKind::Insert,
                    ctx,
                });
            }
        }
    }

    Ok(outcome)
}
