// Settings store backed by SQLite.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use confsync_core::{
    Cluster, ClusterId, Hive, HiveId, Setting, SettingStore, SettingValue, StoreError,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS hives (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    parent_id INTEGER REFERENCES hives(id),
    defined_at_hive INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS clusters (
    id INTEGER PRIMARY KEY,
    hive_id INTEGER NOT NULL REFERENCES hives(id),
    name TEXT NOT NULL,
    UNIQUE (hive_id, name)
);

CREATE TABLE IF NOT EXISTS settings (
    cluster_id INTEGER NOT NULL REFERENCES clusters(id),
    name TEXT NOT NULL,
    value_type INTEGER NOT NULL,  -- 0=bool, 1=int, 2=float, 3=text
    value_int INTEGER,
    value_num REAL,
    value_text TEXT,
    PRIMARY KEY (cluster_id, name)
);
"#;

// Value type constants
const TYPE_BOOL: i64 = 0;
const TYPE_INT: i64 = 1;
const TYPE_FLOAT: i64 = 2;
const TYPE_TEXT: i64 = 3;

/// `SettingStore` on a SQLite file.
///
/// Mutations open an explicit transaction lazily; `commit`/`rollback` close
/// it. One transaction spans everything the engine stages for a hive.
pub struct SqliteStore {
    conn: Connection,
    in_txn: bool,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn,
            in_txn: false,
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn,
            in_txn: false,
        })
    }

    fn begin_if_needed(&mut self) -> Result<(), StoreError> {
        if !self.in_txn {
            self.conn
                .execute("BEGIN TRANSACTION", [])
                .map_err(db_err)?;
            self.in_txn = true;
        }
        Ok(())
    }

    fn hive_id(&self, name: &str) -> Result<Option<HiveId>, StoreError> {
        self.conn
            .query_row("SELECT id FROM hives WHERE name = ?1", params![name], |row| {
                row.get::<_, i64>(0)
            })
            .optional()
            .map_err(db_err)
            .map(|id| id.map(HiveId))
    }

    fn load_settings(&self, cluster: ClusterId) -> Result<Vec<Setting>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name, value_type, value_int, value_num, value_text \
                 FROM settings WHERE cluster_id = ?1 ORDER BY name",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![cluster.0], |row| {
                let name: String = row.get(0)?;
                let value_type: i64 = row.get(1)?;
                let value_int: Option<i64> = row.get(2)?;
                let value_num: Option<f64> = row.get(3)?;
                let value_text: Option<String> = row.get(4)?;
                Ok((name, value_type, value_int, value_num, value_text))
            })
            .map_err(db_err)?;

        let mut settings = Vec::new();
        for row in rows {
            let (name, value_type, value_int, value_num, value_text) = row.map_err(db_err)?;
            let value = decode(value_type, value_int, value_num, value_text)?;
            settings.push(Setting { name, value });
        }
        Ok(settings)
    }
}

impl SettingStore for SqliteStore {
    fn hive_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.hive_id(name)?.is_some())
    }

    fn cluster_exists(&self, hive: &str, key: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT c.id FROM clusters c \
                 JOIN hives h ON h.id = c.hive_id \
                 WHERE h.name = ?1 AND c.name = ?2",
                params![hive, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    fn create_hive(
        &mut self,
        name: &str,
        parent: Option<HiveId>,
        defined_at_hive: bool,
    ) -> Result<Hive, StoreError> {
        self.begin_if_needed()?;
        self.conn
            .execute(
                "INSERT INTO hives (name, parent_id, defined_at_hive) VALUES (?1, ?2, ?3)",
                params![name, parent.map(|p| p.0), defined_at_hive as i64],
            )
            .map_err(db_err)?;
        Ok(Hive {
            id: HiveId(self.conn.last_insert_rowid()),
            name: name.to_string(),
            parent,
            defined_at_hive,
            clusters: Vec::new(),
        })
    }

    fn create_cluster(&mut self, hive: &str, key: &str) -> Result<Cluster, StoreError> {
        self.begin_if_needed()?;
        let hive_id = self
            .hive_id(hive)?
            .ok_or_else(|| StoreError::new(format!("hive '{hive}' not found")))?;
        self.conn
            .execute(
                "INSERT INTO clusters (hive_id, name) VALUES (?1, ?2)",
                params![hive_id.0, key],
            )
            .map_err(db_err)?;
        Ok(Cluster::new(
            ClusterId(self.conn.last_insert_rowid()),
            hive_id,
            key,
        ))
    }

    fn load_all_hives(&self) -> Result<Vec<Hive>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, parent_id, defined_at_hive FROM hives ORDER BY id")
            .map_err(db_err)?;
        let hive_rows: Vec<(i64, String, Option<i64>, i64)> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .map_err(db_err)?
            .collect::<Result<_, _>>()
            .map_err(db_err)?;

        let mut hives = Vec::with_capacity(hive_rows.len());
        for (id, name, parent_id, defined_at_hive) in hive_rows {
            let mut stmt = self
                .conn
                .prepare("SELECT id, name FROM clusters WHERE hive_id = ?1 ORDER BY id")
                .map_err(db_err)?;
            let cluster_rows: Vec<(i64, String)> = stmt
                .query_map(params![id], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(db_err)?
                .collect::<Result<_, _>>()
                .map_err(db_err)?;

            let mut clusters = Vec::with_capacity(cluster_rows.len());
            for (cluster_id, cluster_name) in cluster_rows {
                let mut cluster = Cluster::new(ClusterId(cluster_id), HiveId(id), cluster_name);
                for setting in self.load_settings(cluster.id)? {
                    cluster.set(setting);
                }
                clusters.push(cluster);
            }

            hives.push(Hive {
                id: HiveId(id),
                name,
                parent: parent_id.map(HiveId),
                defined_at_hive: defined_at_hive != 0,
                clusters,
            });
        }
        Ok(hives)
    }

    fn persist(&mut self, cluster: &Cluster) -> Result<(), StoreError> {
        self.begin_if_needed()?;
        self.conn
            .execute(
                "DELETE FROM settings WHERE cluster_id = ?1",
                params![cluster.id.0],
            )
            .map_err(db_err)?;

        let mut stmt = self
            .conn
            .prepare(
                "INSERT INTO settings (cluster_id, name, value_type, value_int, value_num, value_text) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(db_err)?;
        for setting in cluster.settings.values() {
            let (value_type, value_int, value_num, value_text) = encode(&setting.value);
            stmt.execute(params![
                cluster.id.0,
                setting.name,
                value_type,
                value_int,
                value_num,
                value_text
            ])
            .map_err(db_err)?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_txn {
            self.conn.execute("COMMIT", []).map_err(db_err)?;
            self.in_txn = false;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if self.in_txn {
            self.in_txn = false;
            self.conn.execute("ROLLBACK", []).map_err(db_err)?;
        }
        Ok(())
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::new(e.to_string())
}

fn encode(value: &SettingValue) -> (i64, Option<i64>, Option<f64>, Option<String>) {
    match value {
        SettingValue::Bool(b) => (TYPE_BOOL, Some(i64::from(*b)), None, None),
        SettingValue::Int(n) => (TYPE_INT, Some(*n), None, None),
        SettingValue::Float(x) => (TYPE_FLOAT, None, Some(*x), None),
        SettingValue::Str(s) => (TYPE_TEXT, None, None, Some(s.clone())),
    }
}

fn decode(
    value_type: i64,
    value_int: Option<i64>,
    value_num: Option<f64>,
    value_text: Option<String>,
) -> Result<SettingValue, StoreError> {
    match value_type {
        TYPE_BOOL => Ok(SettingValue::Bool(value_int.unwrap_or(0) != 0)),
        TYPE_INT => Ok(SettingValue::Int(value_int.unwrap_or(0))),
        TYPE_FLOAT => Ok(SettingValue::Float(value_num.unwrap_or(0.0))),
        TYPE_TEXT => Ok(SettingValue::Str(value_text.unwrap_or_default())),
        other => Err(StoreError::new(format!("unknown value_type {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.create_hive("app", None, true).unwrap();
            let mut cluster = store.create_cluster("app", "primary").unwrap();
            cluster.set(Setting::new("timeout", 30));
            cluster.set(Setting::new("log_level", "info"));
            cluster.set(Setting::new("debug", false));
            cluster.set(Setting::new("ratio", 0.25));
            store.persist(&cluster).unwrap();
            store.commit().unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let hives = store.load_all_hives().unwrap();
        assert_eq!(hives.len(), 1);
        assert!(hives[0].defined_at_hive);

        let cluster = &hives[0].clusters[0];
        assert_eq!(cluster.setting("timeout").unwrap().value, SettingValue::Int(30));
        assert_eq!(
            cluster.setting("log_level").unwrap().value,
            SettingValue::Str("info".into())
        );
        assert_eq!(
            cluster.setting("debug").unwrap().value,
            SettingValue::Bool(false)
        );
        assert_eq!(
            cluster.setting("ratio").unwrap().value,
            SettingValue::Float(0.25)
        );
    }

    #[test]
    fn rollback_discards_uncommitted_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let mut store = SqliteStore::open(&path).unwrap();
        store.create_hive("app", None, true).unwrap();
        store.commit().unwrap();

        store.create_cluster("app", "primary").unwrap();
        assert!(store.cluster_exists("app", "primary").unwrap());
        store.rollback().unwrap();
        assert!(!store.cluster_exists("app", "primary").unwrap());

        // Committed hive survived the rollback.
        assert!(store.hive_exists("app").unwrap());
    }

    #[test]
    fn persist_replaces_settings_wholesale() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.create_hive("app", None, true).unwrap();
        let mut cluster = store.create_cluster("app", "primary").unwrap();
        cluster.set(Setting::new("a", 1));
        cluster.set(Setting::new("b", 2));
        store.persist(&cluster).unwrap();
        store.commit().unwrap();

        cluster.remove("a");
        cluster.set(Setting::new("c", 3));
        store.persist(&cluster).unwrap();
        store.commit().unwrap();

        let hives = store.load_all_hives().unwrap();
        let keys: Vec<&str> = hives[0].clusters[0].keys().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn exists_checks() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.hive_exists("app").unwrap());
        store.create_hive("app", None, false).unwrap();
        assert!(store.hive_exists("app").unwrap());
        assert!(!store.cluster_exists("app", "primary").unwrap());
        store.create_cluster("app", "primary").unwrap();
        assert!(store.cluster_exists("app", "primary").unwrap());
        assert!(!store.cluster_exists("other", "primary").unwrap());
    }

    #[test]
    fn nested_hives_keep_parent_links() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let root = store.create_hive("platform", None, false).unwrap();
        store.create_hive("platform-eu", Some(root.id), true).unwrap();
        store.commit().unwrap();

        let hives = store.load_all_hives().unwrap();
        assert_eq!(hives[1].parent, Some(root.id));
    }
}
