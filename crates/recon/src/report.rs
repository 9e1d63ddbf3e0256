use serde::Serialize;

use crate::cluster::ClusterOutcome;

/// Applied/declined tally for one operation class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpCounts {
    pub applied: usize,
    pub declined: usize,
}

impl OpCounts {
    pub fn proposed(&self) -> usize {
        self.applied + self.declined
    }
}

/// An entry the run had to skip: a definition that would not load, a cluster
/// with no matching definition, a hive that vanished underneath the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipEntry {
    pub subject: String,
    pub reason: String,
}

/// A hive whose commit failed. Its changes were discarded; later hives were
/// still processed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitFailure {
    pub hive: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
}

/// Summary of one reconciliation run.
///
/// Counts track confirmations: an operation is `applied` once the policy
/// confirmed it and the cluster was mutated. Durability is a separate
/// question answered by `hives_committed` and `commit_failures`.
#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub inserts: OpCounts,
    pub updates: OpCounts,
    pub deletes: OpCounts,
    pub hives_committed: usize,
    pub commit_failures: Vec<CommitFailure>,
    pub skipped: Vec<SkipEntry>,
    pub cancelled: bool,
}

impl ReconReport {
    pub(crate) fn new() -> Self {
        Self {
            meta: ReconMeta {
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            inserts: OpCounts::default(),
            updates: OpCounts::default(),
            deletes: OpCounts::default(),
            hives_committed: 0,
            commit_failures: Vec::new(),
            skipped: Vec::new(),
            cancelled: false,
        }
    }

    pub fn applied(&self) -> usize {
        self.inserts.applied + self.updates.applied + self.deletes.applied
    }

    pub fn declined(&self) -> usize {
        self.inserts.declined + self.updates.declined + self.deletes.declined
    }

    /// Divergences left in place by declined proposals.
    pub fn unresolved(&self) -> usize {
        self.declined()
    }

    /// True when the run proposed nothing and skipped nothing: the store
    /// already matched the definitions.
    pub fn is_fixed_point(&self) -> bool {
        self.applied() == 0
            && self.declined() == 0
            && self.commit_failures.is_empty()
            && self.skipped.is_empty()
    }

    pub(crate) fn absorb(&mut self, outcome: &ClusterOutcome) {
        self.inserts.applied += outcome.inserts_applied;
        self.inserts.declined += outcome.inserts_declined;
        self.updates.applied += outcome.updates_applied;
        self.updates.declined += outcome.updates_declined;
        self.deletes.applied += outcome.deletes_applied;
        self.deletes.declined += outcome.deletes_declined;
    }
}
