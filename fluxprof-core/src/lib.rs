#![warn(missing_docs)]
//! FluxProf Core - Unit Model and Phase Lifecycle
//!
//! This crate provides the building blocks of the profile collection pipeline:
//! - `Unit` and `Job` value objects describing configured plugin instances
//! - The `CollectStatus`/`PostprocessStatus` pair with the reported-status
//!   equivalence rule for third-party plugins
//! - The three-phase lifecycle machine (`before` → primary verb → `after`)
//! - The `inventory`-backed registry of collector and postprocessor units

mod phases;
mod registry;
mod status;

pub use phases::{run_phases, ParamBag, PhaseError, PhaseFn, PhaseReport, UnitPhases};
pub use registry::{RegistryResolver, UnitResolver};
pub use status::{CollectStatus, PostprocessStatus, ReportedStatus, UnitKind};

use serde::{Deserialize, Serialize};

/// Profile artifact produced by a collector and rewritten by postprocessors.
///
/// Profiles are opaque to the pipeline: the only keys the core reads are
/// `origin` (attached during finalization) and `profile` (the phase machine's
/// completion contract).
pub type Profile = serde_json::Map<String, serde_json::Value>;

/// One configured collector or postprocessor plugin instance.
///
/// Immutable once built; created during matrix construction or when appending
/// an ad-hoc postprocessor to an already stored profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Registered name of the plugin
    pub name: String,
    /// Configured parameters, seeded into the phase parameter bag
    #[serde(default)]
    pub params: ParamBag,
}

impl Unit {
    /// Build a unit from a name and its configured parameters.
    pub fn new(name: impl Into<String>, params: ParamBag) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// One concrete execution request: a target command with one argument variant
/// and one workload, paired with exactly one collector and zero or more
/// postprocessors applied in declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Collector unit producing the raw profile
    pub collector: Unit,
    /// Postprocessor units, applied in this exact order
    pub postprocessors: Vec<Unit>,
    /// Target command
    pub cmd: String,
    /// Workload fed to the command
    pub workload: String,
    /// Argument variant
    pub args: String,
}

impl Job {
    /// Seed a phase parameter bag from this job's fields.
    ///
    /// These are the base keys every unit invocation sees; unit params are
    /// merged on top by the runner.
    pub fn to_params(&self) -> ParamBag {
        let mut bag = ParamBag::new();
        bag.insert("cmd".into(), self.cmd.clone().into());
        bag.insert("workload".into(), self.workload.clone().into());
        bag.insert("args".into(), self.args.clone().into());
        bag
    }
}

/// One version-control revision to check out and measure.
///
/// Supplied externally as an ordered list; the pipeline never creates or
/// mutates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinorVersion {
    /// Revision checksum understood by the VCS collaborator
    pub checksum: String,
    /// Commit author, when the VCS provides it
    #[serde(default)]
    pub author: Option<String>,
    /// One-line commit description, when the VCS provides it
    #[serde(default)]
    pub description: Option<String>,
}

impl MinorVersion {
    /// A minor version carrying only a checksum.
    pub fn from_checksum(checksum: impl Into<String>) -> Self {
        Self {
            checksum: checksum.into(),
            author: None,
            description: None,
        }
    }
}

/// Collector unit registered via `inventory::submit!`
#[derive(Debug)]
pub struct CollectorDef {
    /// Registered name, matched against configured collector names
    pub name: &'static str,
    /// Optional setup phase
    pub before: Option<PhaseFn>,
    /// Primary phase; a unit missing it fails at run time
    pub collect: Option<PhaseFn>,
    /// Optional teardown phase
    pub after: Option<PhaseFn>,
}

/// Postprocessor unit registered via `inventory::submit!`
#[derive(Debug)]
pub struct PostprocessorDef {
    /// Registered name, matched against configured postprocessor names
    pub name: &'static str,
    /// Optional setup phase
    pub before: Option<PhaseFn>,
    /// Primary phase; a unit missing it fails at run time
    pub postprocess: Option<PhaseFn>,
    /// Optional teardown phase
    pub after: Option<PhaseFn>,
}

inventory::collect!(CollectorDef);
inventory::collect!(PostprocessorDef);

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<CollectorDef> {}
    for _ in inventory::iter::<PostprocessorDef> {}
};
