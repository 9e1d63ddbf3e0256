// Interactive confirmation for proposed operations.

use std::io::{self, BufRead, Write};

use confsync_recon::{ChangeContext, ConfirmationPolicy, ForceFlags, OperationKind};

/// Prompts on stderr and reads y/N from stdin.
///
/// Force flags bypass the prompt per operation kind. When stdin is not a
/// terminal and no force flag applies, the proposal is declined: an
/// unavailable confirmation channel is never an error.
pub struct PromptPolicy {
    force: ForceFlags,
    interactive: bool,
}

impl PromptPolicy {
    pub fn new(force: ForceFlags) -> Self {
        Self {
            force,
            interactive: atty::is(atty::Stream::Stdin),
        }
    }
}

impl ConfirmationPolicy for PromptPolicy {
    fn confirm(&mut self, kind: OperationKind, ctx: &ChangeContext) -> bool {
        if self.force.allows(kind) {
            return true;
        }
        if !self.interactive {
            return false;
        }
        ask(kind, ctx).unwrap_or(false)
    }
}

fn describe(ctx: &ChangeContext) -> String {
    match (&ctx.current, &ctx.proposed) {
        (Some(current), Some(proposed)) => format!(" {current} -> {proposed}"),
        (None, Some(proposed)) => format!(" = {proposed}"),
        (Some(current), None) => format!(" (currently {current})"),
        (None, None) => String::new(),
    }
}

fn ask(kind: OperationKind, ctx: &ChangeContext) -> io::Result<bool> {
    eprint!(
        "{kind} {}{} ({}), apply? [y/N] ",
        ctx.target(),
        describe(ctx),
        ctx.reason
    );
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ChangeContext {
        ChangeContext {
            hive: "app".into(),
            cluster: Some("primary".into()),
            setting: Some("timeout".into()),
            current: Some("abc".into()),
            proposed: Some("30".into()),
            reason: "expected int, got string (abc)".into(),
        }
    }

    #[test]
    fn force_flags_bypass_the_prompt() {
        let mut policy = PromptPolicy {
            force: ForceFlags {
                insert: false,
                update: true,
                delete: false,
            },
            interactive: false,
        };
        assert!(policy.confirm(OperationKind::Update, &ctx()));
    }

    #[test]
    fn non_interactive_without_force_declines() {
        let mut policy = PromptPolicy {
            force: ForceFlags::default(),
            interactive: false,
        };
        assert!(!policy.confirm(OperationKind::Insert, &ctx()));
        assert!(!policy.confirm(OperationKind::Delete, &ctx()));
    }

    #[test]
    fn describe_shows_the_transition() {
        assert_eq!(describe(&ctx()), " abc -> 30");

        let insert = ChangeContext {
            current: None,
            ..ctx()
        };
        assert_eq!(describe(&insert), " = 30");

        let delete = ChangeContext {
            proposed: None,
            ..ctx()
        };
        assert_eq!(describe(&delete), " (currently abc)");
    }
}
