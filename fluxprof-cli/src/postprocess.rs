//! Built-in Postprocessors
//!
//! Ships the stock `normalizer` postprocessor: scales every resource
//! amount into the unit interval relative to the largest amount in the
//! profile, which makes profiles of different magnitudes comparable.

use fluxprof_core::{ParamBag, PhaseReport, PostprocessorDef, UnitKind};
use serde_json::Value;

fn normalize_postprocess(params: &ParamBag) -> PhaseReport {
    let Some(mut profile) = params.get("profile").and_then(Value::as_object).cloned() else {
        return PhaseReport::error(UnitKind::Postprocessor, "no profile to normalize");
    };

    let Some(resources) = profile.get_mut("resources").and_then(Value::as_array_mut) else {
        return PhaseReport::error(UnitKind::Postprocessor, "profile has no resources");
    };

    let maximum = resources
        .iter()
        .filter_map(|r| r.get("amount").and_then(Value::as_f64))
        .fold(0.0_f64, f64::max);

    if maximum > 0.0 {
        for resource in resources.iter_mut() {
            let Some(amount) = resource.get("amount").and_then(Value::as_f64) else {
                continue;
            };
            if let Some(object) = resource.as_object_mut() {
                object.insert("amount".into(), (amount / maximum).into());
            }
        }
    }

    let mut updates = ParamBag::new();
    updates.insert("profile".into(), Value::Object(profile));
    PhaseReport::ok(UnitKind::Postprocessor).with_updates(updates)
}

inventory::submit! {
    PostprocessorDef {
        name: "normalizer",
        before: None,
        postprocess: Some(normalize_postprocess),
        after: None,
    }
}
