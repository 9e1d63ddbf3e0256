// Filesystem definition source: a directory of TOML files.

use std::fs;
use std::path::{Path, PathBuf};

use confsync_recon::{
    DefinitionScope, DefinitionSource, LoadedDefinitions, SettingDefinition, SkippedDefinition,
    SourceError,
};

/// Loads definitions from a directory of `*.toml` files.
///
/// Files are read in lexicographic filename order. A file that fails to
/// parse or validate is skipped and reported, never fatal for the run.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn definition_files(&self) -> Result<Vec<PathBuf>, SourceError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            SourceError::new(format!("cannot read {}: {e}", self.dir.display()))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        files.sort();
        Ok(files)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl DefinitionSource for DirectorySource {
    fn load_all(&self) -> Result<LoadedDefinitions, SourceError> {
        let mut loaded = LoadedDefinitions::default();
        for path in self.definition_files()? {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    loaded.skipped.push(SkippedDefinition {
                        source: file_label(&path),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            match SettingDefinition::from_toml(&text) {
                Ok(definition) => loaded.definitions.push(definition),
                Err(e) => loaded.skipped.push(SkippedDefinition {
                    source: file_label(&path),
                    reason: e.to_string(),
                }),
            }
        }
        Ok(loaded)
    }

    fn load_for(
        &self,
        hive: &str,
        cluster: Option<&str>,
    ) -> Result<Option<SettingDefinition>, SourceError> {
        let loaded = self.load_all()?;
        if let Some(cluster) = cluster {
            let scoped = loaded
                .definitions
                .iter()
                .find(|d| d.hive == hive && d.scope.cluster_key() == Some(cluster));
            if let Some(definition) = scoped {
                return Ok(Some(definition.clone()));
            }
        }
        Ok(loaded
            .definitions
            .into_iter()
            .find(|d| d.hive == hive && d.scope == DefinitionScope::Hive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn loads_in_filename_order_and_skips_bad_files() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "20-jobs.toml",
            "hive = \"jobs\"\nscope = \"cluster\"\ncluster = \"nightly\"\n",
        );
        write(tmp.path(), "10-app.toml", "hive = \"app\"\n");
        write(tmp.path(), "30-bad.toml", "hive = \"broken\"\nscope = \"cluster\"\n");
        write(tmp.path(), "notes.txt", "not a definition");

        let source = DirectorySource::new(tmp.path());
        let loaded = source.load_all().unwrap();

        let hives: Vec<&str> = loaded.definitions.iter().map(|d| d.hive.as_str()).collect();
        assert_eq!(hives, vec!["app", "jobs"]);

        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].source, "30-bad.toml");
        assert!(loaded.skipped[0].reason.contains("missing required cluster key"));
    }

    #[test]
    fn load_for_prefers_cluster_scope() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "app.toml", "hive = \"app\"\n");
        write(
            tmp.path(),
            "app-primary.toml",
            "hive = \"app\"\nscope = \"cluster\"\ncluster = \"primary\"\n",
        );

        let source = DirectorySource::new(tmp.path());

        let scoped = source.load_for("app", Some("primary")).unwrap().unwrap();
        assert_eq!(scoped.scope.cluster_key(), Some("primary"));

        // Unknown cluster falls back to the hive-scoped definition.
        let fallback = source.load_for("app", Some("other")).unwrap().unwrap();
        assert!(fallback.scope.is_hive());

        let hive_level = source.load_for("app", None).unwrap().unwrap();
        assert!(hive_level.scope.is_hive());

        assert!(source.load_for("missing", None).unwrap().is_none());
    }

    #[test]
    fn unreadable_directory_is_an_error() {
        let source = DirectorySource::new("/no/such/dir/anywhere");
        assert!(source.load_all().is_err());
    }
}
