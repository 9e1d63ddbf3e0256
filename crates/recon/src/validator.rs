//! Per-setting validation and sanitization.
//!
//! `validate` never fails: a non-compliant value is data (an update
//! candidate), not an error. `sanitize` is deterministic and pure in
//! `(node, setting)`; applied to its own output it is a no-op.

use confsync_core::{Setting, SettingValue, ValueKind};
use regex::Regex;

use crate::definition::SettingNode;
use crate::rule::{Rule, SanitizeMode};

/// Outcome of validating one stored setting against its node.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub valid: bool,
    /// Human-readable reason when invalid, empty otherwise.
    pub message: String,
}

impl Verdict {
    fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Check a stored setting against its definition node.
pub fn validate(node: &SettingNode, setting: &Setting) -> Verdict {
    let value = &setting.value;
    let expected = node.kind();
    if value.kind() != expected {
        return Verdict::fail(format!(
            "expected {expected}, got {} ({value})",
            value.kind()
        ));
    }

    match &node.rule {
        Rule::TypeOnly => Verdict::ok(),
        Rule::Range { min, max } => match value.as_f64() {
            Some(x) if x >= *min && x <= *max => Verdict::ok(),
            Some(x) => Verdict::fail(format!("{x} outside range {min}..={max}")),
            None => Verdict::fail(format!("{value} is not numeric")),
        },
        Rule::OneOf { choices } => {
            if choices.contains(value) {
                Verdict::ok()
            } else {
                Verdict::fail(format!("{value} is not {}", node.rule.describe()))
            }
        }
        Rule::Pattern { regex } => match full_match(regex, value) {
            Ok(true) => Verdict::ok(),
            Ok(false) => Verdict::fail(format!("{value} does not match /{regex}/")),
            Err(msg) => Verdict::fail(msg),
        },
        Rule::Custom { check } => match custom_check(check, value) {
            Some(true) => Verdict::ok(),
            Some(false) => Verdict::fail(format!("{value} fails check '{check}'")),
            None => Verdict::fail(format!("unknown check '{check}'")),
        },
    }
}

/// Coerce a setting toward compliance with its node.
///
/// Returns a new setting with the same name. When the node's mode is
/// `Reset`, or no safe coercion exists, the value is the node's declared
/// default.
pub fn sanitize(node: &SettingNode, setting: &Setting) -> Setting {
    let value = match node.sanitize {
        SanitizeMode::Reset => node.default.clone(),
        SanitizeMode::Coerce => coerce(node, &setting.value),
    };
    Setting {
        name: setting.name.clone(),
        value,
    }
}

fn coerce(node: &SettingNode, value: &SettingValue) -> SettingValue {
    // Bring the value to the expected kind first, then repair per rule.
    let Some(cast) = cast_kind(value, node.kind()) else {
        return node.default.clone();
    };
    match &node.rule {
        Rule::TypeOnly => cast,
        Rule::Range { min, max } => clamp(cast, *min, *max),
        Rule::OneOf { choices } => {
            if choices.contains(&cast) {
                cast
            } else {
                node.default.clone()
            }
        }
        Rule::Pattern { regex } => {
            if full_match(regex, &cast).unwrap_or(false) {
                cast
            } else {
                node.default.clone()
            }
        }
        Rule::Custom { check } => {
            if custom_check(check, &cast).unwrap_or(false) {
                cast
            } else {
                node.default.clone()
            }
        }
    }
}

/// Lossless-ish conversions between scalar kinds. Anything unlisted has no
/// safe coercion.
fn cast_kind(value: &SettingValue, kind: ValueKind) -> Option<SettingValue> {
    use SettingValue::{Bool, Float, Int, Str};

    if value.kind() == kind {
        return Some(value.clone());
    }
    match (value, kind) {
        (Str(s), ValueKind::Int) => s.trim().parse::<i64>().ok().map(Int),
        (Str(s), ValueKind::Float) => s.trim().parse::<f64>().ok().map(Float),
        (Str(s), ValueKind::Bool) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(Bool(true)),
            "false" | "no" | "off" | "0" => Some(Bool(false)),
            _ => None,
        },
        (Int(n), ValueKind::Float) => Some(Float(*n as f64)),
        (Float(x), ValueKind::Int) if x.fract() == 0.0 => Some(Int(*x as i64)),
        (v, ValueKind::Str) => Some(Str(v.to_string())),
        _ => None,
    }
}

fn clamp(value: SettingValue, min: f64, max: f64) -> SettingValue {
    match value {
        SettingValue::Int(n) => {
            let lo = min.ceil() as i64;
            let hi = max.floor() as i64;
            let clamped = if n < lo {
                lo
            } else if n > hi {
                hi
            } else {
                n
            };
            SettingValue::Int(clamped)
        }
        SettingValue::Float(x) => SettingValue::Float(x.clamp(min, max)),
        other => other,
    }
}

fn full_match(pattern: &str, value: &SettingValue) -> Result<bool, String> {
    let Some(s) = value.as_str() else {
        return Ok(false);
    };
    // Pattern rules match the whole string.
    let re = Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| format!("invalid pattern /{pattern}/: {e}"))?;
    Ok(re.is_match(s))
}

// ---------------------------------------------------------------------------
// Custom checks
// ---------------------------------------------------------------------------

type CheckFn = fn(&SettingValue) -> bool;

/// Named checks available to `Rule::Custom`.
const CUSTOM_CHECKS: &[(&str, CheckFn)] = &[
    ("nonempty", check_nonempty),
    ("absolute_path", check_absolute_path),
    ("lowercase", check_lowercase),
];

/// Run a named check. `None` means the name is unknown.
pub fn custom_check(name: &str, value: &SettingValue) -> Option<bool> {
    CUSTOM_CHECKS
        .iter()
        .find(|(check_name, _)| *check_name == name)
        .map(|(_, check)| check(value))
}

/// True when a named check exists.
pub fn has_custom_check(name: &str) -> bool {
    CUSTOM_CHECKS.iter().any(|(check_name, _)| *check_name == name)
}

fn check_nonempty(value: &SettingValue) -> bool {
    match value {
        SettingValue::Str(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn check_absolute_path(value: &SettingValue) -> bool {
    match value {
        SettingValue::Str(s) => s.starts_with('/'),
        _ => false,
    }
}

fn check_lowercase(value: &SettingValue) -> bool {
    match value {
        SettingValue::Str(s) => !s.chars().any(|c| c.is_ascii_uppercase()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Rule, SanitizeMode};

    fn node(default: SettingValue, rule: Rule) -> SettingNode {
        SettingNode {
            key: "test".to_string(),
            default,
            rule,
            sanitize: SanitizeMode::Coerce,
        }
    }

    #[test]
    fn kind_mismatch_is_invalid() {
        let n = node(SettingValue::Int(30), Rule::TypeOnly);
        let verdict = validate(&n, &Setting::new("test", "abc"));
        assert!(!verdict.valid);
        assert!(verdict.message.contains("expected int"));
    }

    #[test]
    fn range_validates_inclusive_bounds() {
        let n = node(
            SettingValue::Int(30),
            Rule::Range {
                min: 1.0,
                max: 3600.0,
            },
        );
        assert!(validate(&n, &Setting::new("test", 1)).valid);
        assert!(validate(&n, &Setting::new("test", 3600)).valid);
        assert!(!validate(&n, &Setting::new("test", 0)).valid);
        assert!(!validate(&n, &Setting::new("test", 9000)).valid);
    }

    #[test]
    fn sanitize_parses_numeric_strings() {
        let n = node(
            SettingValue::Int(30),
            Rule::Range {
                min: 1.0,
                max: 3600.0,
            },
        );
        let fixed = sanitize(&n, &Setting::new("test", "45"));
        assert_eq!(fixed.value, SettingValue::Int(45));
    }

    #[test]
    fn sanitize_falls_back_to_default_when_unparseable() {
        let n = node(
            SettingValue::Int(30),
            Rule::Range {
                min: 1.0,
                max: 3600.0,
            },
        );
        let fixed = sanitize(&n, &Setting::new("test", "abc"));
        assert_eq!(fixed.value, SettingValue::Int(30));
    }

    #[test]
    fn sanitize_clamps_out_of_range() {
        let n = node(
            SettingValue::Int(30),
            Rule::Range {
                min: 1.0,
                max: 3600.0,
            },
        );
        assert_eq!(
            sanitize(&n, &Setting::new("test", 9000)).value,
            SettingValue::Int(3600)
        );
        assert_eq!(
            sanitize(&n, &Setting::new("test", -5)).value,
            SettingValue::Int(1)
        );
    }

    #[test]
    fn sanitize_one_of_keeps_member_else_default() {
        let n = node(
            SettingValue::Str("info".into()),
            Rule::OneOf {
                choices: vec![
                    SettingValue::Str("error".into()),
                    SettingValue::Str("warn".into()),
                    SettingValue::Str("info".into()),
                ],
            },
        );
        assert_eq!(
            sanitize(&n, &Setting::new("test", "warn")).value,
            SettingValue::Str("warn".into())
        );
        assert_eq!(
            sanitize(&n, &Setting::new("test", "loud")).value,
            SettingValue::Str("info".into())
        );
    }

    #[test]
    fn pattern_is_full_match() {
        let n = node(
            SettingValue::Str("eu-west-1".into()),
            Rule::Pattern {
                regex: "[a-z]+-[a-z]+-[0-9]".into(),
            },
        );
        assert!(validate(&n, &Setting::new("test", "us-east-2")).valid);
        assert!(!validate(&n, &Setting::new("test", "prefix us-east-2")).valid);
    }

    #[test]
    fn reset_mode_goes_straight_to_default() {
        let mut n = node(
            SettingValue::Int(30),
            Rule::Range {
                min: 1.0,
                max: 3600.0,
            },
        );
        n.sanitize = SanitizeMode::Reset;
        assert_eq!(
            sanitize(&n, &Setting::new("test", 9000)).value,
            SettingValue::Int(30)
        );
    }

    #[test]
    fn custom_checks_dispatch_by_name() {
        let n = node(
            SettingValue::Str("/var/lib".into()),
            Rule::Custom {
                check: "absolute_path".into(),
            },
        );
        assert!(validate(&n, &Setting::new("test", "/etc")).valid);
        assert!(!validate(&n, &Setting::new("test", "etc")).valid);

        let unknown = node(
            SettingValue::Str("x".into()),
            Rule::Custom {
                check: "no_such_check".into(),
            },
        );
        let verdict = validate(&unknown, &Setting::new("test", "x"));
        assert!(!verdict.valid);
        assert!(verdict.message.contains("unknown check"));
    }

    #[test]
    fn sanitize_is_idempotent_across_rules() {
        let nodes = [
            node(
                SettingValue::Int(30),
                Rule::Range {
                    min: 1.0,
                    max: 3600.0,
                },
            ),
            node(
                SettingValue::Str("info".into()),
                Rule::OneOf {
                    choices: vec![
                        SettingValue::Str("info".into()),
                        SettingValue::Str("debug".into()),
                    ],
                },
            ),
            node(SettingValue::Bool(true), Rule::TypeOnly),
            node(
                SettingValue::Str("a1".into()),
                Rule::Pattern {
                    regex: "[a-z][0-9]".into(),
                },
            ),
        ];
        let inputs = [
            Setting::new("test", "abc"),
            Setting::new("test", 9000),
            Setting::new("test", "maybe"),
            Setting::new("test", 1.5),
        ];
        for n in &nodes {
            for input in &inputs {
                let once = sanitize(n, input);
                assert!(validate(n, &once).valid, "sanitize output must validate");
                let twice = sanitize(n, &once);
                assert_eq!(once, twice, "sanitize must be a no-op on its own output");
            }
        }
    }
}
