//! Integration tests for FluxProf
//!
//! These tests verify the end-to-end behavior of the collection pipeline:
//! matrix construction, the unit lifecycle, revision replay, and storage.

use fluxprof::{
    build_job_matrix, run_matrix_jobs, run_phases, FluxProfConfig, JobSpecification,
    MinorVersion, ParamBag, PendingStore, PhaseReport, SavedState, UnitKind, UnitPhases,
    UnitResolver, Vcs, VcsError,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::path::PathBuf;

/// Collector phases used across the scenarios: `collect` produces a raw
/// profile, `after` marks it as done.
fn time_collect(_: &ParamBag) -> PhaseReport {
    let mut updates = ParamBag::new();
    updates.insert("profile".into(), json!({"origin": "x"}));
    PhaseReport::ok(UnitKind::Collector).with_updates(updates)
}

fn time_after(params: &ParamBag) -> PhaseReport {
    let mut profile = params
        .get("profile")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    profile.insert("done".into(), json!(true));
    let mut updates = ParamBag::new();
    updates.insert("profile".into(), Value::Object(profile));
    PhaseReport::ok(UnitKind::Collector).with_updates(updates)
}

fn broken_collect(_: &ParamBag) -> PhaseReport {
    PhaseReport::error(UnitKind::Collector, "boom")
}

struct TestResolver;

impl UnitResolver for TestResolver {
    fn collector(&self, name: &str) -> Option<UnitPhases> {
        match name {
            "time" => Some(UnitPhases {
                before: None,
                primary: Some(time_collect),
                after: Some(time_after),
            }),
            "broken" => Some(UnitPhases {
                primary: Some(broken_collect),
                ..Default::default()
            }),
            _ => None,
        }
    }

    fn postprocessor(&self, _name: &str) -> Option<UnitPhases> {
        None
    }
}

/// VCS stand-in that records every interaction.
#[derive(Default)]
struct RecordingVcs {
    events: RefCell<Vec<String>>,
}

impl Vcs for RecordingVcs {
    fn save_state(&self) -> Result<SavedState, VcsError> {
        self.events.borrow_mut().push("save".to_string());
        Ok(SavedState {
            head: "main".to_string(),
            stashed: false,
        })
    }

    fn restore_state(&self, _state: &SavedState) -> Result<(), VcsError> {
        self.events.borrow_mut().push("restore".to_string());
        Ok(())
    }

    fn checkout(&self, checksum: &str) -> Result<(), VcsError> {
        self.events.borrow_mut().push(format!("checkout {checksum}"));
        Ok(())
    }

    fn minor_version(&self, rev: &str) -> Result<MinorVersion, VcsError> {
        Ok(MinorVersion::from_checksum(rev))
    }
}

fn single_collector_spec(collector: &str) -> JobSpecification {
    JobSpecification {
        cmds: vec!["bin".to_string()],
        workloads: vec!["w1".to_string()],
        collectors: vec![collector.to_string()],
        ..Default::default()
    }
}

fn stored_profiles(store: &PendingStore) -> Vec<PathBuf> {
    std::fs::read_dir(store.jobs_dir())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

/// End-to-end: a single job through all three phases ends up stored with
/// the `after` phase's mark and the revision as its origin.
#[test]
fn test_single_job_collects_and_stores() {
    let dir = tempfile::tempdir().unwrap();
    let store = PendingStore::open(dir.path().join(".fluxprof")).unwrap();

    let (matrix, total_steps) = build_job_matrix(&single_collector_spec("time"));
    assert_eq!(matrix.groups.len(), 1);
    assert_eq!(matrix.groups[0].cmd, "bin");
    assert_eq!(matrix.groups[0].workloads[0].workload, "w1");
    assert_eq!(matrix.groups[0].workloads[0].jobs.len(), 1);
    assert_eq!(total_steps, 1);

    let vcs = RecordingVcs::default();
    run_matrix_jobs(
        &vcs,
        &TestResolver,
        &store,
        &FluxProfConfig::default(),
        &matrix,
        total_steps,
        &[MinorVersion::from_checksum("rev1")],
        false,
    )
    .unwrap();

    let profiles = stored_profiles(&store);
    assert_eq!(profiles.len(), 1);

    let stored = PendingStore::load_profile(&profiles[0]).unwrap();
    assert_eq!(stored["done"], true);
    // Finalization stamps the measured revision as the origin
    assert_eq!(stored["origin"], "rev1");
    assert_eq!(stored["header"]["cmd"], "bin");
}

/// End-to-end: a collector failing its primary phase skips the job and
/// writes nothing, and the diagnostic carries the phase's own message.
#[test]
fn test_failing_collector_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = PendingStore::open(dir.path().join(".fluxprof")).unwrap();

    let (matrix, total_steps) = build_job_matrix(&single_collector_spec("broken"));

    let vcs = RecordingVcs::default();
    run_matrix_jobs(
        &vcs,
        &TestResolver,
        &store,
        &FluxProfConfig::default(),
        &matrix,
        total_steps,
        &[MinorVersion::from_checksum("rev1")],
        false,
    )
    .unwrap();

    assert!(stored_profiles(&store).is_empty());

    // The failure message surfaced to the user names the phase and keeps
    // the unit's own message
    let phases = TestResolver.collector("broken").unwrap();
    let mut params = ParamBag::new();
    let err = run_phases("broken", &phases, UnitKind::Collector, &mut params).unwrap_err();
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.to_string(), "error while collect phase: boom");
}

/// Replaying three revisions checks each out in list order under a single
/// clean-state acquisition, even when one revision's pre-phase fails.
#[test]
fn test_replay_checks_out_revisions_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = PendingStore::open(dir.path().join(".fluxprof")).unwrap();

    let (matrix, total_steps) = build_job_matrix(&single_collector_spec("time"));

    // Fails from the second revision onward
    let marker = dir.path().join("marker");
    let mut config = FluxProfConfig::default();
    config.execute.phases.insert(
        "pre_run".to_string(),
        vec![format!("test ! -f {0} && touch {0}", marker.display())],
    );

    let revisions = vec![
        MinorVersion::from_checksum("r1"),
        MinorVersion::from_checksum("r2"),
        MinorVersion::from_checksum("r3"),
    ];

    let vcs = RecordingVcs::default();
    run_matrix_jobs(
        &vcs,
        &TestResolver,
        &store,
        &config,
        &matrix,
        total_steps,
        &revisions,
        true,
    )
    .unwrap();

    let events = vcs.events.borrow();
    assert_eq!(
        *events,
        ["save", "checkout r1", "checkout r2", "checkout r3", "restore"]
    );

    // Only the first revision got past its pre-phase and stored a profile
    assert_eq!(stored_profiles(&store).len(), 1);
}
