#![warn(missing_docs)]
//! # FluxProf
//!
//! Performance profile collection over project history.
//!
//! FluxProf runs pluggable **collector** units against your target
//! commands and chains pluggable **postprocessor** units over the captured
//! data, producing stored profile artifacts - optionally replayed across a
//! list of version-control revisions so performance can be tracked
//! historically:
//! - **Job Matrix**: the cross product of commands × argument variants ×
//!   workloads × collectors, grouped for readable progress output
//! - **Uniform Unit Lifecycle**: every unit runs `before` → verb → `after`
//!   with uniform error semantics; panicking units degrade to diagnostics
//! - **Failure Isolation**: one job's failure never stops the matrix, one
//!   revision's failure never stops the replay
//! - **Clean Workspace Guarantee**: the replay restores your checkout and
//!   uncommitted changes on every exit path
//! - **Deterministic Profile Store**: content-derived names in a
//!   pending-jobs directory, with optional auto-registration
//!
//! ## Quick Start
//!
//! Register a collector and hand `main` to the CLI:
//!
//! ```ignore
//! use fluxprof::{CollectorDef, ParamBag, PhaseReport, UnitKind};
//!
//! fn collect(params: &ParamBag) -> PhaseReport {
//!     let mut updates = ParamBag::new();
//!     updates.insert("profile".into(), measure(params));
//!     PhaseReport::ok(UnitKind::Collector).with_updates(updates)
//! }
//!
//! inventory::submit! {
//!     CollectorDef { name: "time", before: None, collect: Some(collect), after: None }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     fluxprof::run()
//! }
//! ```

// Re-export core types
pub use fluxprof_core::{
    run_phases, CollectStatus, CollectorDef, Job, MinorVersion, ParamBag, PhaseError, PhaseFn,
    PhaseReport, PostprocessStatus, PostprocessorDef, Profile, RegistryResolver, ReportedStatus,
    Unit, UnitKind, UnitPhases, UnitResolver,
};

// Re-export store types
pub use fluxprof_store::{
    extract_job_from_profile, finalize_profile, profile_name, PendingStore, StoreError,
};

// Re-export the execution pipeline
pub use fluxprof_cli::{
    build_job_matrix, resolve_minor_versions, run_collector, run_matrix_jobs,
    run_matrix_on_workdir, run_postprocessor, run_postprocessor_on_profile,
    run_prephase_commands, CleanState, FluxProfConfig, GitVcs, JobMatrix, JobSpecification,
    RunStats, SavedState, Vcs, VcsError,
};

/// Internal re-exports for unit registration
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Run the FluxProf CLI harness.
///
/// Call this from your binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     fluxprof::run()
/// }
/// ```
pub use fluxprof_cli::run;
