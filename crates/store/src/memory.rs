// In-memory settings store for tests and embedding.

use confsync_core::{Cluster, ClusterId, Hive, HiveId, SettingStore, StoreError};

/// `SettingStore` kept entirely in memory, with the same staged/committed
/// split as the SQLite store so commit and rollback are observable.
///
/// Reads see staged mutations, matching a database connection inside an open
/// transaction. `fail_commit` arranges the nth commit of the store's
/// lifetime to fail, for commit-boundary tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: State,
    staged: Option<State>,
    next_id: i64,
    fail_on_commit: Option<usize>,
    commits_seen: usize,
}

#[derive(Debug, Clone, Default)]
struct State {
    hives: Vec<Hive>,
}

impl State {
    fn hive(&self, name: &str) -> Option<&Hive> {
        self.hives.iter().find(|h| h.name == name)
    }

    fn hive_mut(&mut self, name: &str) -> Option<&mut Hive> {
        self.hives.iter_mut().find(|h| h.name == name)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrange the nth commit (0-based) to fail.
    pub fn fail_commit(&mut self, nth: usize) {
        self.fail_on_commit = Some(nth);
    }

    /// Committed state only, staged mutations excluded.
    pub fn committed_hives(&self) -> &[Hive] {
        &self.committed.hives
    }

    fn state(&self) -> &State {
        self.staged.as_ref().unwrap_or(&self.committed)
    }

    fn state_mut(&mut self) -> &mut State {
        let committed = &self.committed;
        self.staged.get_or_insert_with(|| committed.clone())
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl SettingStore for MemoryStore {
    fn hive_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.state().hive(name).is_some())
    }

    fn cluster_exists(&self, hive: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .state()
            .hive(hive)
            .is_some_and(|h| h.cluster(key).is_some()))
    }

    fn create_hive(
        &mut self,
        name: &str,
        parent: Option<HiveId>,
        defined_at_hive: bool,
    ) -> Result<Hive, StoreError> {
        if self.hive_exists(name)? {
            return Err(StoreError::new(format!("hive '{name}' already exists")));
        }
        let hive = Hive {
            id: HiveId(self.next_id()),
            name: name.to_string(),
            parent,
            defined_at_hive,
            clusters: Vec::new(),
        };
        self.state_mut().hives.push(hive.clone());
        Ok(hive)
    }

    fn create_cluster(&mut self, hive: &str, key: &str) -> Result<Cluster, StoreError> {
        if self.cluster_exists(hive, key)? {
            return Err(StoreError::new(format!(
                "cluster '{hive}/{key}' already exists"
            )));
        }
        let id = ClusterId(self.next_id());
        let state = self.state_mut();
        let parent = state
            .hive_mut(hive)
            .ok_or_else(|| StoreError::new(format!("hive '{hive}' not found")))?;
        let cluster = Cluster::new(id, parent.id, key);
        parent.clusters.push(cluster.clone());
        Ok(cluster)
    }

    fn load_all_hives(&self) -> Result<Vec<Hive>, StoreError> {
        Ok(self.state().hives.clone())
    }

    fn persist(&mut self, cluster: &Cluster) -> Result<(), StoreError> {
        let state = self.state_mut();
        for hive in &mut state.hives {
            if let Some(stored) = hive.clusters.iter_mut().find(|c| c.id == cluster.id) {
                *stored = cluster.clone();
                return Ok(());
            }
        }
        Err(StoreError::new(format!(
            "cluster '{}' not found in store",
            cluster.name
        )))
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let nth = self.commits_seen;
        self.commits_seen += 1;
        if self.fail_on_commit == Some(nth) {
            return Err(StoreError::new("injected commit failure"));
        }
        if let Some(staged) = self.staged.take() {
            self.committed = staged;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.staged = None;
        Ok(())
    }
}
