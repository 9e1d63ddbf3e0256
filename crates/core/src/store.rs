use std::fmt;

use crate::model::{Cluster, Hive, HiveId};

/// Error from a settings store backend.
#[derive(Debug, Clone)]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store error: {}", self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<String> for StoreError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// Persistence capability the reconciliation engine works against.
///
/// Mutations accumulate until `commit`; `rollback` discards them. The engine
/// commits once per hive, so a backend must tolerate create/persist calls for
/// several clusters inside one open unit of work.
pub trait SettingStore {
    fn hive_exists(&self, name: &str) -> Result<bool, StoreError>;

    fn cluster_exists(&self, hive: &str, key: &str) -> Result<bool, StoreError>;

    /// Create a hive. `parent` nests it under another hive; reconciliation
    /// always creates root hives.
    fn create_hive(
        &mut self,
        name: &str,
        parent: Option<HiveId>,
        defined_at_hive: bool,
    ) -> Result<Hive, StoreError>;

    /// Create an empty cluster under an existing hive.
    fn create_cluster(&mut self, hive: &str, key: &str) -> Result<Cluster, StoreError>;

    /// Every hive with its clusters and their settings, in creation order.
    /// Uncommitted mutations are visible.
    fn load_all_hives(&self) -> Result<Vec<Hive>, StoreError>;

    /// Stage the cluster's current settings, replacing whatever was stored.
    fn persist(&mut self, cluster: &Cluster) -> Result<(), StoreError>;

    /// Make staged mutations durable.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard staged mutations.
    fn rollback(&mut self) -> Result<(), StoreError>;
}
