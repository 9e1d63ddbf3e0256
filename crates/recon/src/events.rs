//! Structured events emitted during a reconciliation run.
//!
//! The engine has no terminal coupling; a presentation layer renders these
//! however it likes. The `EventCollector` is also how tests verify prompt
//! ordering and fixed-point behavior.

use crate::policy::{ChangeContext, OperationKind};

/// Events emitted by the orchestrator and reconcilers, in run order.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconEvent {
    RunStarted {
        definitions: usize,
    },
    HiveStarted {
        hive: String,
        clusters: usize,
    },
    OperationProposed {
        kind: OperationKind,
        ctx: ChangeContext,
    },
    OperationApplied {
        kind: OperationKind,
        ctx: ChangeContext,
    },
    OperationDeclined {
        kind: OperationKind,
        ctx: ChangeContext,
    },
    /// A cluster (or definition) that could not be reconciled.
    ClusterSkipped {
        hive: String,
        cluster: String,
        reason: String,
    },
    HiveCommitted {
        hive: String,
        applied: usize,
    },
    HiveCommitFailed {
        hive: String,
        error: String,
    },
    RunCompleted {
        applied: usize,
        declined: usize,
    },
}

/// Receiver for run events.
pub trait EventSink {
    fn emit(&mut self, event: ReconEvent);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: ReconEvent) {}
}

/// Collects events for tests.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<ReconEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ReconEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Filter to proposed operations, in order.
    pub fn proposed(&self) -> Vec<(OperationKind, &ChangeContext)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReconEvent::OperationProposed { kind, ctx } => Some((*kind, ctx)),
                _ => None,
            })
            .collect()
    }

    /// Filter to applied operations, in order.
    pub fn applied(&self) -> Vec<(OperationKind, &ChangeContext)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReconEvent::OperationApplied { kind, ctx } => Some((*kind, ctx)),
                _ => None,
            })
            .collect()
    }

    /// Filter to declined operations, in order.
    pub fn declined(&self) -> Vec<(OperationKind, &ChangeContext)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReconEvent::OperationDeclined { kind, ctx } => Some((*kind, ctx)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for EventCollector {
    fn emit(&mut self, event: ReconEvent) {
        self.events.push(event);
    }
}
