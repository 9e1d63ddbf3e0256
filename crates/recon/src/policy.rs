use std::fmt;

use serde::Serialize;

/// The class of a proposed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a proposal is about, for prompts, events and report entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeContext {
    pub hive: String,
    /// Absent for hive-level proposals (hive creation).
    pub cluster: Option<String>,
    /// Absent for entity-level proposals (hive/cluster creation).
    pub setting: Option<String>,
    /// Current stored value, if any.
    pub current: Option<String>,
    /// Value that would be written, if any.
    pub proposed: Option<String>,
    /// Why the change is proposed (e.g. a validation message).
    pub reason: String,
}

impl ChangeContext {
    /// "hive/cluster/setting", trimmed to the parts that apply.
    pub fn target(&self) -> String {
        let mut target = self.hive.clone();
        if let Some(cluster) = &self.cluster {
            target.push('/');
            target.push_str(cluster);
        }
        if let Some(setting) = &self.setting {
            target.push('/');
            target.push_str(setting);
        }
        target
    }
}

/// Decides whether a proposed operation is applied.
///
/// Implementations never fail: an unavailable confirmation channel is an
/// implicit decline, not an error.
pub trait ConfirmationPolicy {
    fn confirm(&mut self, kind: OperationKind, ctx: &ChangeContext) -> bool;
}

/// Per-kind force flags. A set flag bypasses prompting for that class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForceFlags {
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
}

impl ForceFlags {
    pub fn all() -> Self {
        Self {
            insert: true,
            update: true,
            delete: true,
        }
    }

    pub fn any(&self) -> bool {
        self.insert || self.update || self.delete
    }

    pub fn allows(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Insert => self.insert,
            OperationKind::Update => self.update,
            OperationKind::Delete => self.delete,
        }
    }
}

/// Applies operations allowed by its force flags, declines the rest.
/// `ForcedPolicy::all()` is batch mode.
#[derive(Debug, Clone, Copy)]
pub struct ForcedPolicy {
    flags: ForceFlags,
}

impl ForcedPolicy {
    pub fn new(flags: ForceFlags) -> Self {
        Self { flags }
    }

    pub fn all() -> Self {
        Self {
            flags: ForceFlags::all(),
        }
    }
}

impl ConfirmationPolicy for ForcedPolicy {
    fn confirm(&mut self, kind: OperationKind, _ctx: &ChangeContext) -> bool {
        self.flags.allows(kind)
    }
}

/// Declines every proposal. Dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

impl ConfirmationPolicy for DeclineAll {
    fn confirm(&mut self, _kind: OperationKind, _ctx: &ChangeContext) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ChangeContext {
        ChangeContext {
            hive: "app".into(),
            cluster: Some("primary".into()),
            setting: Some("timeout".into()),
            current: None,
            proposed: Some("30".into()),
            reason: "missing from cluster".into(),
        }
    }

    #[test]
    fn target_joins_present_parts() {
        assert_eq!(ctx().target(), "app/primary/timeout");

        let hive_only = ChangeContext {
            hive: "app".into(),
            cluster: None,
            setting: None,
            current: None,
            proposed: None,
            reason: "hive missing from store".into(),
        };
        assert_eq!(hive_only.target(), "app");
    }

    #[test]
    fn forced_policy_follows_flags() {
        let mut policy = ForcedPolicy::new(ForceFlags {
            insert: true,
            update: false,
            delete: true,
        });
        assert!(policy.confirm(OperationKind::Insert, &ctx()));
        assert!(!policy.confirm(OperationKind::Update, &ctx()));
        assert!(policy.confirm(OperationKind::Delete, &ctx()));
    }

    #[test]
    fn decline_all_declines() {
        let mut policy = DeclineAll;
        assert!(!policy.confirm(OperationKind::Insert, &ctx()));
    }
}
