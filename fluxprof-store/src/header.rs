//! Profile Header
//!
//! Finalization attaches job and revision metadata to a raw profile; the
//! header is what makes a stored profile self-describing, so an ad-hoc
//! postprocessing run can reconstruct the originating `Job` from it.

use crate::StoreError;
use chrono::Utc;
use fluxprof_core::{Job, Profile, Unit};
use serde_json::{json, Value};

/// Attach job and revision metadata to a profile.
///
/// Sets `origin`, the `header` block (cmd/args/workload), the collector
/// unit, the postprocessor chain, and a creation timestamp. Finalization is
/// re-entrant: running it again overwrites the same keys, so a profile may
/// be finalized before postprocessing and again at storage time.
pub fn finalize_profile(mut profile: Profile, job: &Job, origin: &str) -> Profile {
    profile.insert("origin".into(), Value::String(origin.to_string()));
    profile.insert(
        "header".into(),
        json!({
            "cmd": job.cmd,
            "args": job.args,
            "workload": job.workload,
        }),
    );
    profile.insert(
        "collector".into(),
        serde_json::to_value(&job.collector).unwrap_or(Value::Null),
    );
    profile.insert(
        "postprocessors".into(),
        serde_json::to_value(&job.postprocessors).unwrap_or_else(|_| json!([])),
    );
    profile.insert("created".into(), Value::String(Utc::now().to_rfc3339()));
    profile
}

/// Compute the deterministic on-disk name for a finalized profile.
///
/// The name is derived from the profile's content: equal content always
/// maps to equal names. Collector, command and workload are woven in for
/// human readability.
pub fn profile_name(profile: &Profile) -> String {
    let collector = profile
        .get("collector")
        .and_then(|c| c.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("profile");
    let cmd = profile
        .get("header")
        .and_then(|h| h.get("cmd"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let workload = profile
        .get("header")
        .and_then(|h| h.get("workload"))
        .and_then(Value::as_str)
        .unwrap_or("");

    // serde_json maps are ordered, so the serialization is canonical
    let serialized = serde_json::to_string(profile).unwrap_or_default();
    let digest = fxhash::hash64(serialized.as_bytes());

    format!(
        "{}-{}-{}-{:016x}.perf",
        sanitize(collector),
        sanitize(cmd),
        sanitize(workload),
        digest
    )
}

/// Reconstruct the originating job from a finalized profile's header.
pub fn extract_job_from_profile(profile: &Profile) -> Result<Job, StoreError> {
    let header = profile
        .get("header")
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::MalformedProfile("missing 'header' block".to_string()))?;

    let field = |key: &str| -> Result<String, StoreError> {
        header
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::MalformedProfile(format!("missing '{key}' in header")))
    };

    let collector: Unit = profile
        .get("collector")
        .cloned()
        .map(serde_json::from_value)
        .transpose()?
        .ok_or_else(|| StoreError::MalformedProfile("missing 'collector' unit".to_string()))?;

    let postprocessors: Vec<Unit> = match profile.get("postprocessors") {
        Some(value) => serde_json::from_value(value.clone())?,
        None => Vec::new(),
    };

    Ok(Job {
        collector,
        postprocessors,
        cmd: field("cmd")?,
        workload: field("workload")?,
        args: field("args")?,
    })
}

/// Replace path-hostile characters so the name is safe as a file name.
fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '-' })
        .collect();
    if cleaned.is_empty() {
        "none".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxprof_core::ParamBag;

    fn sample_job() -> Job {
        let mut params = ParamBag::new();
        params.insert("warmup".into(), json!(2));
        Job {
            collector: Unit::new("time", params),
            postprocessors: vec![Unit::new("normalizer", ParamBag::new())],
            cmd: "target/release/bin".to_string(),
            workload: "w1".to_string(),
            args: "--fast".to_string(),
        }
    }

    #[test]
    fn test_finalize_attaches_header() {
        let mut raw = Profile::new();
        raw.insert("resources".into(), json!([{"amount": 10}]));

        let finalized = finalize_profile(raw, &sample_job(), "abc123");

        assert_eq!(finalized["origin"], "abc123");
        assert_eq!(finalized["header"]["cmd"], "target/release/bin");
        assert_eq!(finalized["header"]["workload"], "w1");
        assert_eq!(finalized["collector"]["name"], "time");
        assert_eq!(finalized["postprocessors"][0]["name"], "normalizer");
        // The raw payload survives finalization
        assert_eq!(finalized["resources"][0]["amount"], 10);
    }

    #[test]
    fn test_finalize_is_reentrant() {
        let finalized = finalize_profile(Profile::new(), &sample_job(), "abc123");
        let again = finalize_profile(finalized.clone(), &sample_job(), "def456");

        assert_eq!(again["origin"], "def456");
        assert_eq!(again["header"], finalized["header"]);
    }

    #[test]
    fn test_profile_name_is_deterministic() {
        let finalized = finalize_profile(Profile::new(), &sample_job(), "abc123");

        let first = profile_name(&finalized);
        let second = profile_name(&finalized);
        assert_eq!(first, second);
        assert!(first.starts_with("time-target-release-bin-w1-"));
        assert!(first.ends_with(".perf"));
    }

    #[test]
    fn test_profile_name_tracks_content() {
        let finalized = finalize_profile(Profile::new(), &sample_job(), "abc123");
        let mut changed = finalized.clone();
        changed.insert("resources".into(), json!([1, 2, 3]));

        assert_ne!(profile_name(&finalized), profile_name(&changed));
    }

    #[test]
    fn test_extract_job_roundtrip() {
        let job = sample_job();
        let finalized = finalize_profile(Profile::new(), &job, "abc123");

        let extracted = extract_job_from_profile(&finalized).unwrap();
        assert_eq!(extracted, job);
    }

    #[test]
    fn test_extract_job_rejects_headerless_profile() {
        let err = extract_job_from_profile(&Profile::new()).unwrap_err();
        assert!(err.to_string().contains("missing 'header'"));
    }
}
