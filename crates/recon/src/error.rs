use std::fmt;

use confsync_core::StoreError;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error in a definition file.
    DefinitionParse(String),
    /// Definition validation error (missing cluster key, duplicate setting,
    /// rule incompatible with its default, ...).
    DefinitionInvalid(String),
    /// Persistence failure surfaced from the settings store.
    Store(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefinitionParse(msg) => write!(f, "definition parse error: {msg}"),
            Self::DefinitionInvalid(msg) => write!(f, "definition validation error: {msg}"),
            Self::Store(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<StoreError> for ReconError {
    fn from(err: StoreError) -> Self {
        Self::Store(err.message().to_string())
    }
}
