//! Job Executor
//!
//! Runs the job matrix and produces stored profiles, one revision at a
//! time.
//!
//! ## Pipeline Overview
//!
//! ```text
//! JobMatrix (from configuration)
//!       │
//!       ▼
//! ┌─────────────┐
//! │   replay    │  Clean-state guard, checkout, pre-phase commands
//! └──────┬──────┘
//!        │  per revision
//!        ▼
//! ┌─────────────┐
//! │    jobs     │  Iterate (cmd, workload, job) in matrix order
//! └──────┬──────┘
//!        │  per job
//!        ▼
//! ┌─────────────┐
//! │    units    │  Resolve unit, run before → verb → after phases
//! └──────┬──────┘
//!        │
//!        ▼
//!   PendingStore (finalized profile on disk)
//! ```
//!
//! ## Modules
//!
//! - [`replay`] - Revision replay loop with workspace restoration
//! - [`jobs`] - Per-revision matrix execution and progress accounting
//! - [`units`] - Collector/postprocessor invocation via the phase machine

mod jobs;
mod replay;
mod units;

pub use jobs::{run_matrix_on_workdir, RunStats};
pub use replay::{run_matrix_jobs, run_prephase_commands, History};
pub use units::{run_collector, run_postprocessor, run_postprocessor_on_profile};
