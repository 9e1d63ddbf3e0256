use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::SettingValue;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Store-assigned hive identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HiveId(pub i64);

/// Store-assigned cluster identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub i64);

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// One named value inside a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub name: String,
    pub value: SettingValue,
}

impl Setting {
    pub fn new(name: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A cluster of settings under a hive.
///
/// Settings live in a BTreeMap keyed by name: iteration order is
/// deterministic, which keeps prompt sequences reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub hive: HiveId,
    pub name: String,
    pub settings: BTreeMap<String, Setting>,
}

impl Cluster {
    pub fn new(id: ClusterId, hive: HiveId, name: impl Into<String>) -> Self {
        Self {
            id,
            hive,
            name: name.into(),
            settings: BTreeMap::new(),
        }
    }

    pub fn setting(&self, key: &str) -> Option<&Setting> {
        self.settings.get(key)
    }

    /// Insert or replace a setting, keyed by its name.
    pub fn set(&mut self, setting: Setting) {
        self.settings.insert(setting.name.clone(), setting);
    }

    pub fn remove(&mut self, key: &str) -> Option<Setting> {
        self.settings.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }
}

/// Root grouping entity.
///
/// `defined_at_hive` means every child cluster shares one hive-scoped
/// definition; otherwise each cluster is defined individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hive {
    pub id: HiveId,
    pub name: String,
    pub parent: Option<HiveId>,
    pub defined_at_hive: bool,
    pub clusters: Vec<Cluster>,
}

impl Hive {
    pub fn cluster(&self, name: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_set_and_remove() {
        let mut cluster = Cluster::new(ClusterId(1), HiveId(1), "primary");
        cluster.set(Setting::new("timeout", 30));
        cluster.set(Setting::new("timeout", 60));

        assert_eq!(cluster.settings.len(), 1);
        assert_eq!(cluster.setting("timeout").unwrap().value, SettingValue::Int(60));

        assert!(cluster.remove("timeout").is_some());
        assert!(cluster.remove("timeout").is_none());
    }

    #[test]
    fn cluster_keys_are_sorted() {
        let mut cluster = Cluster::new(ClusterId(1), HiveId(1), "primary");
        cluster.set(Setting::new("zeta", 1));
        cluster.set(Setting::new("alpha", 2));

        let keys: Vec<&str> = cluster.keys().collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }
}
