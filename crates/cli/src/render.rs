// Human-readable event rendering to stderr.

use confsync_recon::{EventSink, ReconEvent};

/// Renders engine events as progress lines on stderr.
///
/// Proposals are not rendered; the prompt (or the force flag) already covers
/// them. Machine output stays on stdout.
pub struct StderrSink {
    pub quiet: bool,
}

impl EventSink for StderrSink {
    fn emit(&mut self, event: ReconEvent) {
        if self.quiet {
            return;
        }
        match event {
            ReconEvent::RunStarted { definitions } => {
                eprintln!("reconciling {definitions} definition(s)");
            }
            ReconEvent::HiveStarted { hive, clusters } => {
                eprintln!("hive '{hive}': {clusters} cluster(s)");
            }
            ReconEvent::OperationProposed { .. } => {}
            ReconEvent::OperationApplied { kind, ctx } => {
                eprintln!("  {kind} {}: applied", ctx.target());
            }
            ReconEvent::OperationDeclined { kind, ctx } => {
                eprintln!("  {kind} {}: declined", ctx.target());
            }
            ReconEvent::ClusterSkipped {
                hive,
                cluster,
                reason,
            } => {
                eprintln!("  skip {hive}/{cluster}: {reason}");
            }
            ReconEvent::HiveCommitted { hive, applied } => {
                eprintln!("hive '{hive}': committed ({applied} change(s))");
            }
            ReconEvent::HiveCommitFailed { hive, error } => {
                eprintln!("hive '{hive}': commit failed: {error}");
            }
            ReconEvent::RunCompleted { applied, declined } => {
                eprintln!("done: {applied} applied, {declined} declined");
            }
        }
    }
}
