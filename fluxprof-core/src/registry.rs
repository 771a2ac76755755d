//! Unit Registry
//!
//! Maps configured unit names to their executable capability sets. The
//! default resolver walks the `inventory` registries populated at link time;
//! embedders and tests can supply their own `UnitResolver`.

use crate::phases::UnitPhases;
use crate::{CollectorDef, PostprocessorDef};

/// Resolution of unit names to capability sets.
///
/// Returning `None` means the unit does not exist; the runner turns that
/// into a per-job diagnostic rather than an error that aborts the batch.
pub trait UnitResolver {
    /// Look up a collector by its registered name.
    fn collector(&self, name: &str) -> Option<UnitPhases>;

    /// Look up a postprocessor by its registered name.
    fn postprocessor(&self, name: &str) -> Option<UnitPhases>;
}

/// Resolver backed by the static `inventory` registries.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryResolver;

impl UnitResolver for RegistryResolver {
    fn collector(&self, name: &str) -> Option<UnitPhases> {
        inventory::iter::<CollectorDef>
            .into_iter()
            .find(|def| def.name == name)
            .map(|def| UnitPhases {
                before: def.before,
                primary: def.collect,
                after: def.after,
            })
    }

    fn postprocessor(&self, name: &str) -> Option<UnitPhases> {
        inventory::iter::<PostprocessorDef>
            .into_iter()
            .find(|def| def.name == name)
            .map(|def| UnitPhases {
                before: def.before,
                primary: def.postprocess,
                after: def.after,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::{ParamBag, PhaseReport};
    use crate::UnitKind;
    use serde_json::json;

    fn noop_collect(_: &ParamBag) -> PhaseReport {
        let mut updates = ParamBag::new();
        updates.insert("profile".into(), json!({}));
        PhaseReport::ok(UnitKind::Collector).with_updates(updates)
    }

    inventory::submit! {
        CollectorDef {
            name: "registry-test-noop",
            before: None,
            collect: Some(noop_collect),
            after: None,
        }
    }

    #[test]
    fn test_registered_collector_resolves() {
        let phases = RegistryResolver.collector("registry-test-noop").unwrap();
        assert!(phases.primary.is_some());
        assert!(phases.before.is_none());
    }

    #[test]
    fn test_unknown_unit_does_not_resolve() {
        assert!(RegistryResolver.collector("no-such-unit").is_none());
        assert!(RegistryResolver.postprocessor("no-such-unit").is_none());
    }
}
