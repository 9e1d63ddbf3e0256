//! `confsync-core`: domain model for the settings store.
//!
//! Hives group clusters, clusters hold settings. Ownership is a plain tree;
//! parent links are explicit ids rather than object references.

pub mod model;
pub mod store;
pub mod value;

pub use model::{Cluster, ClusterId, Hive, HiveId, Setting};
pub use store::{SettingStore, StoreError};
pub use value::{SettingValue, ValueKind};
