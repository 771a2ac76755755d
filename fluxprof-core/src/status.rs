//! Unit Status Model
//!
//! Collection and postprocessing have independent two-valued status
//! enumerations with matching semantics. Third-party units are allowed to
//! report either the named value or its raw ordinal; the equivalence check
//! lives here and the ordinal form never travels past the phase machine.

use serde::{Deserialize, Serialize};

/// Lifecycle kind of a pluggable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Produces raw performance data from a target command
    Collector,
    /// Transforms an already collected profile
    Postprocessor,
}

impl UnitKind {
    /// The kind's name as it appears in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Collector => "collector",
            UnitKind::Postprocessor => "postprocessor",
        }
    }

    /// Name of the kind's primary phase, derived by dropping the trailing
    /// classifier ("collector" → "collect").
    pub fn verb(self) -> &'static str {
        match self {
            UnitKind::Collector => "collect",
            UnitKind::Postprocessor => "postprocess",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one collection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CollectStatus {
    /// Collection succeeded
    Ok = 0,
    /// Collection failed
    Error = 1,
}

/// Status of one postprocessing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PostprocessStatus {
    /// Postprocessing succeeded
    Ok = 0,
    /// Postprocessing failed
    Error = 1,
}

/// Status as reported from third-party phase code.
///
/// Unit authors do not always behave well: a phase may report the raw
/// ordinal instead of the named value. Both forms must be accepted at the
/// boundary where plugin results are received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedStatus {
    /// Named collection status
    Collect(CollectStatus),
    /// Named postprocessing status
    Postprocess(PostprocessStatus),
    /// Raw ordinal form (0 = OK, 1 = ERROR)
    Ordinal(u8),
}

impl ReportedStatus {
    /// Whether this reported status counts as OK for the given lifecycle.
    ///
    /// A status is OK if it is the kind's OK enumerator or that enumerator's
    /// ordinal. A named status of the wrong kind is never OK.
    pub fn is_ok_for(self, kind: UnitKind) -> bool {
        match (self, kind) {
            (ReportedStatus::Collect(status), UnitKind::Collector) => status == CollectStatus::Ok,
            (ReportedStatus::Postprocess(status), UnitKind::Postprocessor) => {
                status == PostprocessStatus::Ok
            }
            (ReportedStatus::Ordinal(code), _) => code == CollectStatus::Ok as u8,
            _ => false,
        }
    }
}

impl From<CollectStatus> for ReportedStatus {
    fn from(status: CollectStatus) -> Self {
        ReportedStatus::Collect(status)
    }
}

impl From<PostprocessStatus> for ReportedStatus {
    fn from(status: PostprocessStatus) -> Self {
        ReportedStatus::Postprocess(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_status_matches_kind() {
        assert!(ReportedStatus::Collect(CollectStatus::Ok).is_ok_for(UnitKind::Collector));
        assert!(!ReportedStatus::Collect(CollectStatus::Error).is_ok_for(UnitKind::Collector));
        assert!(
            ReportedStatus::Postprocess(PostprocessStatus::Ok).is_ok_for(UnitKind::Postprocessor)
        );
    }

    #[test]
    fn test_ordinal_is_equivalent_to_named() {
        // 0 is the ordinal of Ok for both lifecycles
        assert!(ReportedStatus::Ordinal(0).is_ok_for(UnitKind::Collector));
        assert!(ReportedStatus::Ordinal(0).is_ok_for(UnitKind::Postprocessor));
        assert!(!ReportedStatus::Ordinal(1).is_ok_for(UnitKind::Collector));
        assert!(!ReportedStatus::Ordinal(2).is_ok_for(UnitKind::Postprocessor));
    }

    #[test]
    fn test_wrong_kind_is_never_ok() {
        assert!(!ReportedStatus::Postprocess(PostprocessStatus::Ok).is_ok_for(UnitKind::Collector));
        assert!(!ReportedStatus::Collect(CollectStatus::Ok).is_ok_for(UnitKind::Postprocessor));
    }

    #[test]
    fn test_verb_derivation() {
        assert_eq!(UnitKind::Collector.verb(), "collect");
        assert_eq!(UnitKind::Postprocessor.verb(), "postprocess");
    }
}
