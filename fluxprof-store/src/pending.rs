//! Pending-Jobs Store
//!
//! Freshly generated profiles land in the pending-jobs directory under the
//! store root. Registration moves a profile into the permanent registry and
//! records it in the per-origin index. The pending directory is append-only
//! from the pipeline's perspective; concurrent runs are not coordinated.

use crate::header::{finalize_profile, profile_name};
use crate::StoreError;
use chrono::Utc;
use fluxprof_core::{Job, Profile};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// On-disk profile store rooted at a `.fluxprof` directory.
#[derive(Debug, Clone)]
pub struct PendingStore {
    root: PathBuf,
}

impl PendingStore {
    /// Open (creating if necessary) a store under the given root.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { root: root.into() };
        fs::create_dir_all(store.jobs_dir())?;
        fs::create_dir_all(store.registry_dir())?;
        Ok(store)
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding pending (not yet registered) profiles.
    pub fn jobs_dir(&self) -> PathBuf {
        self.root.join("jobs")
    }

    /// Directory holding registered profiles and per-origin indexes.
    pub fn registry_dir(&self) -> PathBuf {
        self.root.join("registry")
    }

    /// Finalize, name, and persist a generated profile.
    ///
    /// The profile is written into the pending-jobs directory. With
    /// `register_after_run` set it is immediately moved into the permanent
    /// registry instead of keeping a duplicate pending copy. Returns the
    /// path the profile ended up at.
    pub fn store(
        &self,
        profile: Profile,
        job: &Job,
        origin: &str,
        register_after_run: bool,
    ) -> Result<PathBuf, StoreError> {
        let full_profile = finalize_profile(profile, job, origin);
        let name = profile_name(&full_profile);
        let pending_path = self.jobs_dir().join(&name);

        self.write_profile(&full_profile, &pending_path)?;
        tracing::info!("stored profile at: {}", pending_path.display());

        if register_after_run {
            let registered = self.register(&pending_path, origin, false)?;
            return Ok(registered);
        }
        Ok(pending_path)
    }

    /// Serialize a profile to the given path.
    pub fn write_profile(&self, profile: &Profile, path: &Path) -> Result<(), StoreError> {
        let file = fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, profile)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a stored profile back from disk.
    pub fn load_profile(path: &Path) -> Result<Profile, StoreError> {
        let content = fs::read_to_string(path)?;
        let profile: Profile = serde_json::from_str(&content)?;
        Ok(profile)
    }

    /// Register a stored profile into the permanent per-origin index.
    ///
    /// Copies the profile into the registry, appends an index entry keyed by
    /// `origin`, and removes the pending copy unless `keep_profile` is set.
    /// Returns the registered path.
    pub fn register(
        &self,
        path: &Path,
        origin: &str,
        keep_profile: bool,
    ) -> Result<PathBuf, StoreError> {
        let name = path
            .file_name()
            .ok_or_else(|| {
                StoreError::MalformedProfile(format!("not a profile path: {}", path.display()))
            })?
            .to_string_lossy()
            .into_owned();

        let registered_path = self.registry_dir().join(&name);
        fs::copy(path, &registered_path)?;

        let entry = json!({
            "profile": name,
            "origin": origin,
            "registered": Utc::now().to_rfc3339(),
        });
        let index_path = self.registry_dir().join(format!("{origin}.index"));
        let mut index = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&index_path)?;
        writeln!(index, "{entry}")?;

        if !keep_profile {
            fs::remove_file(path)?;
        }

        tracing::info!("registered profile {} for {}", name, origin);
        Ok(registered_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxprof_core::{ParamBag, Unit};

    fn sample_job() -> Job {
        Job {
            collector: Unit::new("time", ParamBag::new()),
            postprocessors: Vec::new(),
            cmd: "bin".to_string(),
            workload: "w1".to_string(),
            args: String::new(),
        }
    }

    #[test]
    fn test_store_writes_pending_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::open(dir.path().join(".fluxprof")).unwrap();

        let mut profile = Profile::new();
        profile.insert("resources".into(), json!([{"amount": 1}]));

        let path = store.store(profile, &sample_job(), "abc123", false).unwrap();
        assert!(path.starts_with(store.jobs_dir()));
        assert!(path.exists());

        let loaded = PendingStore::load_profile(&path).unwrap();
        assert_eq!(loaded["origin"], "abc123");
        assert_eq!(loaded["resources"][0]["amount"], 1);
    }

    #[test]
    fn test_register_after_run_moves_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::open(dir.path().join(".fluxprof")).unwrap();

        let path = store
            .store(Profile::new(), &sample_job(), "abc123", true)
            .unwrap();

        // No pending duplicate is kept
        assert!(path.starts_with(store.registry_dir()));
        assert!(path.exists());
        assert_eq!(fs::read_dir(store.jobs_dir()).unwrap().count(), 0);

        let index = fs::read_to_string(store.registry_dir().join("abc123.index")).unwrap();
        assert_eq!(index.lines().count(), 1);
        assert!(index.contains("\"origin\":\"abc123\""));
    }

    #[test]
    fn test_register_keep_profile_retains_pending_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::open(dir.path().join(".fluxprof")).unwrap();

        let pending = store
            .store(Profile::new(), &sample_job(), "abc123", false)
            .unwrap();
        let registered = store.register(&pending, "abc123", true).unwrap();

        assert!(pending.exists());
        assert!(registered.exists());
    }
}
