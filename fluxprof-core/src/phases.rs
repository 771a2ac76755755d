//! Phase Lifecycle Machine
//!
//! Drives one plugin unit through the fixed three-phase lifecycle
//! (`before` → primary verb → `after`), normalizing heterogeneous
//! success/error signaling and accumulating parameters across phases.
//!
//! Phase code is third-party: every invocation is wrapped in
//! `catch_unwind`, so a panicking unit degrades to an ERROR with the panic
//! message instead of tearing down the whole run.

use crate::status::{ReportedStatus, UnitKind};
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

/// The mutable parameter mapping threaded through one unit invocation.
///
/// Seeded from the job's fields plus the unit's configured params; each
/// phase may return updates that are merged in before the next phase runs.
pub type ParamBag = serde_json::Map<String, serde_json::Value>;

/// Return value of one phase invocation.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    /// Status as reported by the unit (named or raw ordinal form)
    pub status: ReportedStatus,
    /// Diagnostic message; surfaced to the user when the status is not OK
    pub message: String,
    /// Parameter updates merged into the bag before the next phase
    pub updates: Option<ParamBag>,
}

impl PhaseReport {
    /// Successful phase with no message and no parameter updates.
    pub fn ok(kind: UnitKind) -> Self {
        Self {
            status: match kind {
                UnitKind::Collector => crate::CollectStatus::Ok.into(),
                UnitKind::Postprocessor => crate::PostprocessStatus::Ok.into(),
            },
            message: String::new(),
            updates: None,
        }
    }

    /// Failed phase carrying a diagnostic message.
    pub fn error(kind: UnitKind, message: impl Into<String>) -> Self {
        Self {
            status: match kind {
                UnitKind::Collector => crate::CollectStatus::Error.into(),
                UnitKind::Postprocessor => crate::PostprocessStatus::Error.into(),
            },
            message: message.into(),
            updates: None,
        }
    }

    /// Attach parameter updates to this report.
    pub fn with_updates(mut self, updates: ParamBag) -> Self {
        self.updates = Some(updates);
        self
    }
}

/// One lifecycle phase implementation.
///
/// Phases receive the current parameter bag and report status, message and
/// parameter updates. They are free to panic; the machine catches it.
pub type PhaseFn = fn(&ParamBag) -> PhaseReport;

/// Capability set of a resolved unit: any subset of the three phases.
///
/// Only the primary phase is mandatory, and that is enforced at run time
/// rather than by the type, because unit registration is third-party.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitPhases {
    /// Optional setup phase
    pub before: Option<PhaseFn>,
    /// The kind's primary verb phase (`collect` or `postprocess`)
    pub primary: Option<PhaseFn>,
    /// Optional teardown phase
    pub after: Option<PhaseFn>,
}

/// Failure of one unit invocation.
///
/// These never escape the unit runner as errors; they are normalized to the
/// two-valued statuses with their rendered message.
#[derive(Debug, Error, PartialEq)]
pub enum PhaseError {
    /// A phase reported a non-OK status (or panicked)
    #[error("error while {phase} phase: {message}")]
    Phase {
        /// Which phase failed (`before_collect`, `collect`, `after_collect`, ...)
        phase: String,
        /// The phase's own diagnostic message
        message: String,
    },

    /// The unit does not implement its mandatory primary phase
    #[error("missing {verb}() function for {unit}")]
    MissingPrimary {
        /// The kind's primary verb
        verb: &'static str,
        /// Name of the offending unit
        unit: String,
    },

    /// All phases passed but no `profile` key ended up in the bag
    #[error("missing generated profile for {kind} {unit}")]
    MissingProfile {
        /// Lifecycle kind of the unit
        kind: &'static str,
        /// Name of the offending unit
        unit: String,
    },
}

/// Which of the three lifecycle slots a phase occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Before,
    Primary,
    After,
}

impl Slot {
    fn function(self, phases: &UnitPhases) -> Option<PhaseFn> {
        match self {
            Slot::Before => phases.before,
            Slot::Primary => phases.primary,
            Slot::After => phases.after,
        }
    }

    /// Diagnostic label: the primary slot is named by the verb alone, the
    /// others carry the verb as a suffix (`before_collect`, `after_collect`).
    fn label(self, kind: UnitKind) -> String {
        match self {
            Slot::Before => format!("before_{}", kind.verb()),
            Slot::Primary => kind.verb().to_string(),
            Slot::After => format!("after_{}", kind.verb()),
        }
    }
}

/// Run all phases of one unit invocation against the given parameter bag.
///
/// Phases execute strictly in order `before` → primary verb → `after`.
/// Absent phases are silently skipped, except the primary phase whose
/// absence fails the invocation. After each phase the reported updates are
/// merged into the bag, so later phases and the caller see accumulated
/// state. A non-OK status stops the machine immediately.
///
/// On success the bag must contain a `profile` value, which is returned.
pub fn run_phases(
    unit_name: &str,
    phases: &UnitPhases,
    kind: UnitKind,
    params: &mut ParamBag,
) -> Result<serde_json::Value, PhaseError> {
    for slot in [Slot::Before, Slot::Primary, Slot::After] {
        let Some(phase_fn) = slot.function(phases) else {
            if slot == Slot::Primary {
                return Err(PhaseError::MissingPrimary {
                    verb: kind.verb(),
                    unit: unit_name.to_string(),
                });
            }
            continue;
        };

        let report = match catch_unwind(AssertUnwindSafe(|| phase_fn(params))) {
            Ok(report) => report,
            Err(panic) => PhaseReport::error(kind, panic_message(panic)),
        };

        if let Some(updates) = report.updates {
            params.extend(updates);
        }

        if !report.status.is_ok_for(kind) {
            return Err(PhaseError::Phase {
                phase: slot.label(kind),
                message: report.message,
            });
        }
    }

    match params.get("profile") {
        Some(profile) => Ok(profile.clone()),
        None => Err(PhaseError::MissingProfile {
            kind: kind.as_str(),
            unit: unit_name.to_string(),
        }),
    }
}

/// Render a caught panic payload as a diagnostic message.
fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic in unit phase".to_string()
    }
}
