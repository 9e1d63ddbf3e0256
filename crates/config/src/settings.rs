// Tool settings
// Loaded from ~/.config/confsync/settings.json

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Paths
    #[serde(rename = "store.path")]
    pub store_path: Option<PathBuf>,

    #[serde(rename = "definitions.dir")]
    pub definitions_dir: Option<PathBuf>,

    // Default force flags for `confsync reconcile`
    #[serde(rename = "reconcile.forceInsert")]
    pub force_insert: bool,

    #[serde(rename = "reconcile.forceUpdate")]
    pub force_update: bool,

    #[serde(rename = "reconcile.forceDelete")]
    pub force_delete: bool,

    // Output
    #[serde(rename = "output.quiet")]
    pub quiet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: None,
            definitions_dir: None,
            force_insert: false,
            force_update: false,
            force_delete: false,
            quiet: false,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("confsync");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        eprintln!("Error parsing settings.json: {}", e);
                        eprintln!("Using default settings");
                        Self::default()
                    }
                }
            }
            Err(e) => {
                eprintln!("Error reading settings.json: {}", e);
                Self::default()
            }
        }
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(&path, json).map_err(|e| e.to_string())
    }

    /// Store path: configured value, or the platform data dir.
    pub fn effective_store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("confsync")
                .join("store.db")
        })
    }

    /// Definitions directory: configured value, or the config dir.
    pub fn effective_definitions_dir(&self) -> PathBuf {
        self.definitions_dir.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("confsync")
                .join("definitions")
        })
    }
}
