//! Unit Invocation
//!
//! Resolves a configured unit to its registered capability set, seeds the
//! phase parameter bag from the job context, and drives the phase machine.
//! Every failure mode here - unknown unit, phase error, panic, missing
//! profile - is contained: callers get a status and an empty profile, never
//! an error that could abort the batch.

use fluxprof_core::{
    run_phases, CollectStatus, Job, ParamBag, PostprocessStatus, Profile, Unit, UnitKind,
    UnitResolver,
};
use fluxprof_store::{extract_job_from_profile, PendingStore, StoreError};
use serde_json::Value;

/// Run the collector of the given unit for one job.
///
/// Returns the collection status and the produced profile; on any failure
/// the profile is empty and a diagnostic has been reported.
pub fn run_collector(
    resolver: &dyn UnitResolver,
    collector: &Unit,
    job: &Job,
) -> (CollectStatus, Profile) {
    tracing::info!("collecting data by {}", collector.name);

    let Some(phases) = resolver.collector(&collector.name) else {
        tracing::error!("{} does not exist", collector.name);
        return (CollectStatus::Error, Profile::new());
    };

    // Job context first, unit params take precedence on collision
    let mut params = job.to_params();
    params.extend(collector.params.clone());

    match run_phases(&collector.name, &phases, UnitKind::Collector, &mut params) {
        Ok(profile) => {
            println!("Successfully collected data from {}", job.cmd);
            (CollectStatus::Ok, as_profile(profile))
        }
        Err(e) => {
            tracing::error!("{e}");
            (CollectStatus::Error, Profile::new())
        }
    }
}

/// Run the postprocessor of the given unit over a collected profile.
pub fn run_postprocessor(
    resolver: &dyn UnitResolver,
    postprocessor: &Unit,
    job: &Job,
    profile: Profile,
) -> (PostprocessStatus, Profile) {
    tracing::info!("postprocessing data with {}", postprocessor.name);

    let Some(phases) = resolver.postprocessor(&postprocessor.name) else {
        tracing::error!("{} does not exist", postprocessor.name);
        return (PostprocessStatus::Error, Profile::new());
    };

    // Job context, then the incoming profile, then unit params. A unit
    // param literally named `profile` shadows the incoming profile.
    let mut params = job.to_params();
    params.insert("profile".into(), Value::Object(profile));
    params.extend(postprocessor.params.clone());

    match run_phases(
        &postprocessor.name,
        &phases,
        UnitKind::Postprocessor,
        &mut params,
    ) {
        Ok(profile) => {
            println!("Successfully postprocessed data by {}", postprocessor.name);
            (PostprocessStatus::Ok, as_profile(profile))
        }
        Err(e) => {
            tracing::error!("{e}");
            (PostprocessStatus::Error, Profile::new())
        }
    }
}

/// Apply an ad-hoc postprocessor to an already stored profile.
///
/// The originating job is reconstructed from the profile's header, the new
/// unit is appended to its postprocessor chain, and on success the result
/// is stored as a fresh pending profile.
pub fn run_postprocessor_on_profile(
    resolver: &dyn UnitResolver,
    store: &PendingStore,
    profile: Profile,
    postprocessor_name: &str,
    postprocessor_params: ParamBag,
    register_after_run: bool,
) -> Result<PostprocessStatus, StoreError> {
    let mut job = extract_job_from_profile(&profile)?;
    let unit = Unit::new(postprocessor_name, postprocessor_params);
    job.postprocessors.push(unit.clone());

    let origin = profile
        .get("origin")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let (status, processed) = run_postprocessor(resolver, &unit, &job, profile);
    if status == PostprocessStatus::Ok {
        store.store(processed, &job, &origin, register_after_run)?;
    }
    Ok(status)
}

/// Profiles are mappings; anything else a unit left under `profile` is
/// treated as an empty profile.
fn as_profile(value: Value) -> Profile {
    match value {
        Value::Object(map) => map,
        _ => Profile::new(),
    }
}
