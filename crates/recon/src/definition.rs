use confsync_core::{Setting, SettingValue, ValueKind};
use serde::Deserialize;

use crate::error::ReconError;
use crate::rule::{Rule, SanitizeMode};
use crate::validator;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Where a definition applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionScope {
    /// One shared definition for every cluster under the hive.
    Hive,
    /// Exactly one named cluster.
    Cluster { key: String },
}

impl DefinitionScope {
    pub fn is_hive(&self) -> bool {
        matches!(self, Self::Hive)
    }

    pub fn cluster_key(&self) -> Option<&str> {
        match self {
            Self::Hive => None,
            Self::Cluster { key } => Some(key),
        }
    }
}

/// Definition-side schema for one setting. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SettingNode {
    pub key: String,
    pub default: SettingValue,
    #[serde(default)]
    pub rule: Rule,
    #[serde(default)]
    pub sanitize: SanitizeMode,
}

impl SettingNode {
    /// The value kind this node expects, derived from its default.
    pub fn kind(&self) -> ValueKind {
        self.default.kind()
    }
}

/// A parsed settings definition for one hive, or for one cluster under it.
/// Setting declaration order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingDefinition {
    pub hive: String,
    pub scope: DefinitionScope,
    pub settings: Vec<SettingNode>,
}

impl SettingDefinition {
    pub fn node(&self, key: &str) -> Option<&SettingNode> {
        self.settings.iter().find(|n| n.key == key)
    }

    /// "hive" or "hive/cluster", for messages and report entries.
    pub fn display_name(&self) -> String {
        match &self.scope {
            DefinitionScope::Hive => self.hive.clone(),
            DefinitionScope::Cluster { key } => format!("{}/{key}", self.hive),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawDefinition {
    hive: String,
    #[serde(default = "default_scope")]
    scope: String,
    #[serde(default)]
    cluster: Option<String>,
    #[serde(default)]
    settings: Vec<SettingNode>,
}

fn default_scope() -> String {
    "hive".to_string()
}

impl SettingDefinition {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let raw: RawDefinition =
            toml::from_str(input).map_err(|e| ReconError::DefinitionParse(e.to_string()))?;

        let scope = match raw.scope.as_str() {
            "hive" => {
                if raw.cluster.is_some() {
                    return Err(ReconError::DefinitionInvalid(format!(
                        "hive '{}': hive-scoped definition must not name a cluster",
                        raw.hive
                    )));
                }
                DefinitionScope::Hive
            }
            "cluster" => {
                let key = raw.cluster.ok_or_else(|| {
                    ReconError::DefinitionInvalid(format!(
                        "hive '{}': cluster-scoped definition missing required cluster key",
                        raw.hive
                    ))
                })?;
                DefinitionScope::Cluster { key }
            }
            other => {
                return Err(ReconError::DefinitionInvalid(format!(
                    "hive '{}': unknown scope \"{other}\" (expected \"hive\" or \"cluster\")",
                    raw.hive
                )))
            }
        };

        let definition = Self {
            hive: raw.hive,
            scope,
            settings: raw.settings,
        };
        definition.validate()?;
        Ok(definition)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.hive.trim().is_empty() {
            return Err(ReconError::DefinitionInvalid(
                "definition has an empty hive name".into(),
            ));
        }

        for (i, node) in self.settings.iter().enumerate() {
            if node.key.trim().is_empty() {
                return Err(ReconError::DefinitionInvalid(format!(
                    "{}: setting #{} has an empty key",
                    self.display_name(),
                    i + 1
                )));
            }
            if self.settings[..i].iter().any(|n| n.key == node.key) {
                return Err(ReconError::DefinitionInvalid(format!(
                    "{}: duplicate setting key '{}'",
                    self.display_name(),
                    node.key
                )));
            }
            self.validate_node(node)?;
        }

        Ok(())
    }

    fn validate_node(&self, node: &SettingNode) -> Result<(), ReconError> {
        let fail = |msg: String| {
            Err(ReconError::DefinitionInvalid(format!(
                "{}: setting '{}': {msg}",
                self.display_name(),
                node.key
            )))
        };

        match &node.rule {
            Rule::TypeOnly => {}
            Rule::Range { min, max } => {
                if !node.default.is_numeric() {
                    return fail(format!(
                        "range rule requires a numeric default, got {}",
                        node.kind()
                    ));
                }
                if min > max {
                    return fail(format!("empty range {min}..={max}"));
                }
            }
            Rule::OneOf { choices } => {
                if choices.is_empty() {
                    return fail("one_of rule with no choices".into());
                }
                if let Some(bad) = choices.iter().find(|c| c.kind() != node.kind()) {
                    return fail(format!(
                        "choice {bad} has kind {}, default has kind {}",
                        bad.kind(),
                        node.kind()
                    ));
                }
            }
            Rule::Pattern { regex } => {
                if node.kind() != ValueKind::Str {
                    return fail("pattern rule requires a string default".into());
                }
                if let Err(e) = regex::Regex::new(regex) {
                    return fail(format!("invalid pattern /{regex}/: {e}"));
                }
            }
            Rule::Custom { check } => {
                if !validator::has_custom_check(check) {
                    return fail(format!("unknown check '{check}'"));
                }
            }
        }

        // The default is the sanitize fallback, so it must pass its own rule.
        let probe = Setting::new(node.key.clone(), node.default.clone());
        let verdict = validator::validate(node, &probe);
        if !verdict.valid {
            return fail(format!("default fails its own rule: {}", verdict.message));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_HIVE: &str = r#"
hive = "app"
scope = "hive"

[[settings]]
key = "timeout"
default = 30
rule = { type = "range", min = 1, max = 3600 }

[[settings]]
key = "log_level"
default = "info"
rule = { type = "one_of", choices = ["error", "warn", "info", "debug"] }
sanitize = "reset"
"#;

    #[test]
    fn parse_valid_hive_definition() {
        let def = SettingDefinition::from_toml(VALID_HIVE).unwrap();
        assert_eq!(def.hive, "app");
        assert!(def.scope.is_hive());
        assert_eq!(def.settings.len(), 2);
        assert_eq!(def.settings[0].key, "timeout");
        assert_eq!(def.settings[0].default, SettingValue::Int(30));
        assert_eq!(def.settings[1].sanitize, SanitizeMode::Reset);
    }

    #[test]
    fn declaration_order_is_preserved() {
        let def = SettingDefinition::from_toml(
            r#"
hive = "app"

[[settings]]
key = "zeta"
default = 1

[[settings]]
key = "alpha"
default = 2
"#,
        )
        .unwrap();
        let keys: Vec<&str> = def.settings.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn parse_cluster_definition() {
        let def = SettingDefinition::from_toml(
            r#"
hive = "app"
scope = "cluster"
cluster = "primary"

[[settings]]
key = "replicas"
default = 3
"#,
        )
        .unwrap();
        assert_eq!(def.scope.cluster_key(), Some("primary"));
        assert_eq!(def.display_name(), "app/primary");
    }

    #[test]
    fn reject_cluster_scope_without_key() {
        let err = SettingDefinition::from_toml(
            r#"
hive = "app"
scope = "cluster"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing required cluster key"));
    }

    #[test]
    fn reject_unknown_scope() {
        let err = SettingDefinition::from_toml(
            r#"
hive = "app"
scope = "global"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown scope"));
    }

    #[test]
    fn reject_duplicate_keys() {
        let err = SettingDefinition::from_toml(
            r#"
hive = "app"

[[settings]]
key = "timeout"
default = 30

[[settings]]
key = "timeout"
default = 60
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate setting key"));
    }

    #[test]
    fn reject_range_on_string_default() {
        let err = SettingDefinition::from_toml(
            r#"
hive = "app"

[[settings]]
key = "name"
default = "x"
rule = { type = "range", min = 1, max = 2 }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("numeric default"));
    }

    #[test]
    fn reject_default_outside_own_rule() {
        let err = SettingDefinition::from_toml(
            r#"
hive = "app"

[[settings]]
key = "timeout"
default = 0
rule = { type = "range", min = 1, max = 3600 }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("default fails its own rule"));
    }

    #[test]
    fn reject_bad_pattern() {
        let err = SettingDefinition::from_toml(
            r#"
hive = "app"

[[settings]]
key = "region"
default = "eu"
rule = { type = "pattern", regex = "([a-z" }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }
}
