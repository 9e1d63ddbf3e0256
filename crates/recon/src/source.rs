use std::fmt;

use crate::definition::SettingDefinition;

/// Error from a definition source backend (unreadable directory, ...).
/// Per-definition failures are `SkippedDefinition`s, not errors.
#[derive(Debug, Clone)]
pub struct SourceError {
    message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "definition source error: {}", self.message)
    }
}

impl std::error::Error for SourceError {}

/// A definition that could not be loaded; reported, never fatal for the run.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDefinition {
    /// Where it came from (file name, key, ...).
    pub source: String,
    pub reason: String,
}

/// What a source produced: usable definitions plus per-definition failures.
#[derive(Debug, Clone, Default)]
pub struct LoadedDefinitions {
    pub definitions: Vec<SettingDefinition>,
    pub skipped: Vec<SkippedDefinition>,
}

/// Where parsed setting definitions come from.
pub trait DefinitionSource {
    /// Every definition, in source order.
    fn load_all(&self) -> Result<LoadedDefinitions, SourceError>;

    /// The definition applying to `hive`, or to `hive`/`cluster` when a
    /// cluster is given (cluster-scoped definitions take precedence).
    fn load_for(
        &self,
        hive: &str,
        cluster: Option<&str>,
    ) -> Result<Option<SettingDefinition>, SourceError>;
}
