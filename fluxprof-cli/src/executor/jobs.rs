//! Per-Revision Matrix Execution
//!
//! Runs the whole job matrix against the currently checked-out workspace
//! state, in `(cmd, workload, job)` nesting order. One job's failure never
//! aborts the matrix; only storage I/O failures propagate.

use crate::executor::units::{run_collector, run_postprocessor};
use crate::matrix::JobMatrix;
use fluxprof_core::{CollectStatus, PostprocessStatus, UnitResolver};
use fluxprof_store::{finalize_profile, PendingStore, StoreError};
use indicatif::{ProgressBar, ProgressStyle};

/// Outcome accounting for one matrix pass, owned by the caller for the
/// scope of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Jobs whose profile reached the store
    pub stored: usize,
    /// Jobs skipped because their collector failed or produced nothing
    pub skipped: usize,
}

/// Run the batch of jobs on the current state of the workspace.
///
/// Expects the right revision to be checked out already; this function
/// only iterates the matrix. `total_steps` sizes the progress display -
/// steps skipped after a collector failure still count toward the total.
pub fn run_matrix_on_workdir(
    resolver: &dyn UnitResolver,
    store: &PendingStore,
    matrix: &JobMatrix,
    total_steps: u64,
    origin: &str,
    register_after_run: bool,
) -> Result<RunStats, StoreError> {
    let pb = ProgressBar::new(total_steps);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut stats = RunStats::default();

    for group in &matrix.groups {
        pb.println(format!("Collecting profiles for {}", group.cmd));
        for workload in &group.workloads {
            pb.println(format!(" - processing workload {}", workload.workload));
            for job in &workload.jobs {
                pb.set_message(job.collector.name.clone());
                pb.inc(1);

                // A failed or empty collection skips postprocessing and
                // storage for this job
                let (c_status, profile) = run_collector(resolver, &job.collector, job);
                if c_status != CollectStatus::Ok || profile.is_empty() {
                    stats.skipped += 1;
                    continue;
                }

                // Postprocessors act on the finalized shape
                let mut profile = finalize_profile(profile, job, origin);

                for postprocessor in &job.postprocessors {
                    pb.set_message(postprocessor.name.clone());
                    pb.inc(1);

                    let (p_status, processed) =
                        run_postprocessor(resolver, postprocessor, job, profile);
                    profile = processed;
                    if p_status != PostprocessStatus::Ok || profile.is_empty() {
                        continue;
                    }
                }

                // Storage is reached with whatever profile was last
                // produced, even after a postprocessor failure
                store.store(profile, job, origin, register_after_run)?;
                stats.stored += 1;
            }
        }
    }

    pb.finish_and_clear();
    Ok(stats)
}
