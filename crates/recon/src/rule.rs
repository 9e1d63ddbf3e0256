use confsync_core::SettingValue;
use serde::{Deserialize, Serialize};

/// Validation rule attached to a setting node.
///
/// Every rule implies a kind check against the node's default value first;
/// the variants add constraints on top of that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Value kind must match the default's kind. Nothing else.
    TypeOnly,
    /// Numeric value within `[min, max]`, inclusive on both ends.
    Range { min: f64, max: f64 },
    /// Value must equal one of the listed choices.
    OneOf { choices: Vec<SettingValue> },
    /// String value must match the regular expression in full.
    Pattern { regex: String },
    /// Named built-in check, dispatched by name (see `validator::custom_check`).
    Custom { check: String },
}

impl Default for Rule {
    fn default() -> Self {
        Rule::TypeOnly
    }
}

impl Rule {
    /// Short label for messages and prompts.
    pub fn describe(&self) -> String {
        match self {
            Self::TypeOnly => "type check".to_string(),
            Self::Range { min, max } => format!("range {min}..={max}"),
            Self::OneOf { choices } => {
                let list: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
                format!("one of [{}]", list.join(", "))
            }
            Self::Pattern { regex } => format!("pattern /{regex}/"),
            Self::Custom { check } => format!("check '{check}'"),
        }
    }
}

/// How `sanitize` repairs a non-compliant value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizeMode {
    /// Coerce toward compliance (parse, cast, clamp); fall back to the
    /// declared default when no safe coercion exists.
    #[default]
    Coerce,
    /// Replace any non-compliant value with the declared default.
    Reset,
}
