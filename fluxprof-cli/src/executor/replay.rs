//! Revision Replay
//!
//! Re-executes the job matrix under each historical checkout. The whole
//! loop runs inside one clean-workspace guard; failures of checkout or of
//! the pre-phase commands are contained at the revision level, so one bad
//! revision never stops the replay of the remaining ones.

use crate::commands::{run_command_list, CommandError};
use crate::config::FluxProfConfig;
use crate::executor::jobs::{run_matrix_on_workdir, RunStats};
use crate::matrix::JobMatrix;
use crate::vcs::{CleanState, Vcs};
use fluxprof_core::{MinorVersion, UnitResolver};
use fluxprof_store::PendingStore;

/// Observational per-revision progress reporting for `--with-history`.
///
/// Keyed by the first revision of the replay; advanced once per revision
/// and flushed after each. Has no effect on control flow or results.
#[derive(Debug)]
pub struct History {
    total: usize,
    current: usize,
}

impl History {
    /// Open a history session for a replay starting at `head`.
    pub fn new(head: &str, total: usize) -> Self {
        println!("Replaying {} revision(s) starting at {}", total, short(head));
        Self { total, current: 0 }
    }

    /// Advance to the next revision of the replay.
    pub fn next_revision(&mut self, revision: &MinorVersion) {
        self.current += 1;
        let description = revision.description.as_deref().unwrap_or("");
        println!(
            "[{}/{}] {} {}",
            self.current,
            self.total,
            short(&revision.checksum),
            description
        );
    }

    /// Flush the report for a finished revision.
    pub fn flush(&self, stats: &RunStats) {
        println!(
            "    {} profile(s) stored, {} job(s) skipped",
            stats.stored, stats.skipped
        );
    }
}

fn short(checksum: &str) -> &str {
    &checksum[..checksum.len().min(8)]
}

/// Run the configured command list for the phase preceding collection.
///
/// A failing command is reported with its exit code and captured output;
/// the error is returned so the caller can skip the rest of the revision.
pub fn run_prephase_commands(
    config: &FluxProfConfig,
    phase: &str,
) -> Result<(), CommandError> {
    let commands = config.execute.phase_commands(phase);
    if commands.is_empty() {
        return Ok(());
    }

    println!("Running '{phase}' phase");
    run_command_list(commands).inspect_err(|e| {
        tracing::error!(
            "error in {} phase while running '{}' exited with: {} ({})",
            phase,
            e.command,
            e.code,
            e.output
        );
    })
}

/// Replay the job matrix over the given revisions, in order.
///
/// The workspace is captured once before the loop and restored on every
/// exit path. Per revision: check out, run the `pre_run` phase commands,
/// execute the matrix. Checkout and pre-phase failures skip the revision;
/// storage failures abort the run.
pub fn run_matrix_jobs(
    vcs: &dyn Vcs,
    resolver: &dyn UnitResolver,
    store: &PendingStore,
    config: &FluxProfConfig,
    matrix: &JobMatrix,
    total_steps: u64,
    revisions: &[MinorVersion],
    with_history: bool,
) -> anyhow::Result<()> {
    if revisions.is_empty() {
        return Ok(());
    }

    let mut history =
        with_history.then(|| History::new(&revisions[0].checksum, revisions.len()));

    let _workspace = CleanState::acquire(vcs)?;

    for revision in revisions {
        if let Some(history) = history.as_mut() {
            history.next_revision(revision);
        }

        if let Err(e) = vcs.checkout(&revision.checksum) {
            tracing::error!("skipping revision {}: {e}", revision.checksum);
            continue;
        }

        if run_prephase_commands(config, "pre_run").is_err() {
            // Already reported; the rest of this revision is skipped
            continue;
        }

        let stats = run_matrix_on_workdir(
            resolver,
            store,
            matrix,
            total_steps,
            &revision.checksum,
            config.profiles.register_after_run,
        )?;

        if let Some(history) = history.as_ref() {
            history.flush(&stats);
        }
    }

    Ok(())
}
