//! `confsync-recon`: settings reconciliation engine.
//!
//! Diffs setting definitions against stored clusters, classifies each
//! discrepancy (missing, non-compliant, orphaned) and applies the changes a
//! confirmation policy approves. Pure engine crate: no terminal or database
//! coupling; persistence goes through the `SettingStore` trait.

pub mod cluster;
pub mod definition;
pub mod error;
pub mod events;
pub mod hive;
pub mod orchestrator;
pub mod policy;
pub mod report;
pub mod rule;
pub mod source;
pub mod validator;

pub use cluster::{reconcile_cluster, ClusterOutcome};
pub use definition::{DefinitionScope, SettingDefinition, SettingNode};
pub use error::ReconError;
pub use events::{EventCollector, EventSink, NullSink, ReconEvent};
pub use hive::{reconcile_definition, ExistenceOutcome};
pub use orchestrator::{run, CancelToken};
pub use policy::{
    ChangeContext, ConfirmationPolicy, DeclineAll, ForceFlags, ForcedPolicy, OperationKind,
};
pub use report::{CommitFailure, OpCounts, ReconMeta, ReconReport, SkipEntry};
pub use rule::{Rule, SanitizeMode};
pub use source::{DefinitionSource, LoadedDefinitions, SkippedDefinition, SourceError};
pub use validator::{sanitize, validate, Verdict};
