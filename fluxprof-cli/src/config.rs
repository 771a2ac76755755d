//! Configuration loading from fluxprof.toml
//!
//! FluxProf configuration lives in a `fluxprof.toml` file in the project
//! root. The file is discovered by walking up from the current directory;
//! the nearest file wins, which is also how the auto-register flag is
//! looked up (absent keys fall back to their defaults).

use fluxprof_core::ParamBag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// A required configuration section is missing or empty.
#[derive(Debug, Error, PartialEq)]
#[error("missing '{0}' section in fluxprof.toml")]
pub struct MissingSection(pub &'static str);

/// FluxProf configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FluxProfConfig {
    /// Job specification: commands, argument variants, workloads, units
    #[serde(default)]
    pub jobs: JobsConfig,
    /// Shell command lists keyed by phase name (e.g. `pre_run`)
    #[serde(default)]
    pub execute: ExecuteConfig,
    /// Profile lifecycle flags
    #[serde(default)]
    pub profiles: ProfilesConfig,
    /// Store location
    #[serde(default)]
    pub store: StoreConfig,
}

/// One configured unit: a registered name plus its parameter table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Registered unit name
    pub name: String,
    /// Parameters seeded into the unit's phase parameter bag
    #[serde(default)]
    pub params: ParamBag,
}

/// Job specification tables
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobsConfig {
    /// Target commands to measure
    #[serde(default)]
    pub cmds: Vec<String>,
    /// Argument variants; empty means a single empty variant
    #[serde(default)]
    pub args: Vec<String>,
    /// Workloads; empty means a single empty workload
    #[serde(default)]
    pub workloads: Vec<String>,
    /// Collector units to run for every job
    #[serde(default)]
    pub collectors: Vec<UnitConfig>,
    /// Postprocessor units attached to every job, in order
    #[serde(default)]
    pub postprocessors: Vec<UnitConfig>,
}

/// Shell command lists executed around the run, keyed by phase name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecuteConfig {
    /// Phase name → ordered command list
    #[serde(flatten)]
    pub phases: BTreeMap<String, Vec<String>>,
}

impl ExecuteConfig {
    /// Commands configured for the given phase; empty when unset.
    pub fn phase_commands(&self, phase: &str) -> &[String] {
        self.phases.get(phase).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Profile lifecycle flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesConfig {
    /// Register stored profiles into the permanent index right after a run,
    /// without keeping a duplicate pending copy
    #[serde(default)]
    pub register_after_run: bool,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            register_after_run: false,
        }
    }
}

/// Store location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store root directory, relative to the working directory
    #[serde(default = "default_store_directory")]
    pub directory: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_store_directory(),
        }
    }
}

fn default_store_directory() -> String {
    ".fluxprof".to_string()
}

impl FluxProfConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("fluxprof.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# FluxProf Configuration
# https://github.com/ml-rust/fluxprof

[jobs]
# Target commands to measure
cmds = ["target/release/mybin"]
# Argument variants; every variant yields one job per (cmd, workload, collector)
args = []
# Workloads fed to each command
workloads = [""]

# Collector units; each entry needs a registered collector name
[[jobs.collectors]]
name = "time"

# Postprocessor units, applied to every collected profile in order
# [[jobs.postprocessors]]
# name = "normalizer"

[execute]
# Shell commands run after every checkout, before collection starts
pre_run = []

[profiles]
# Register stored profiles into the permanent index right after the run
register_after_run = false

[store]
# Store root directory
directory = ".fluxprof"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FluxProfConfig::default();
        assert!(config.jobs.cmds.is_empty());
        assert!(!config.profiles.register_after_run);
        assert_eq!(config.store.directory, ".fluxprof");
        assert!(config.execute.phase_commands("pre_run").is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [jobs]
            cmds = ["bin"]
            workloads = ["w1", "w2"]

            [[jobs.collectors]]
            name = "time"
            [jobs.collectors.params]
            warmup = 3

            [execute]
            pre_run = ["make build"]

            [profiles]
            register_after_run = true
        "#;

        let config: FluxProfConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.jobs.cmds, vec!["bin"]);
        assert_eq!(config.jobs.workloads, vec!["w1", "w2"]);
        assert_eq!(config.jobs.collectors[0].name, "time");
        assert_eq!(config.jobs.collectors[0].params["warmup"], 3);
        assert_eq!(config.execute.phase_commands("pre_run"), ["make build"]);
        assert!(config.profiles.register_after_run);
        // Defaults should still apply
        assert_eq!(config.store.directory, ".fluxprof");
    }

    #[test]
    fn test_unknown_phase_has_no_commands() {
        let config = FluxProfConfig::default();
        assert!(config.execute.phase_commands("post_run").is_empty());
    }

    #[test]
    fn test_default_toml_parses() {
        let default_toml = FluxProfConfig::default_toml();
        let config: FluxProfConfig = toml::from_str(&default_toml).unwrap();
        assert_eq!(config.jobs.collectors[0].name, "time");
        assert_eq!(config.jobs.workloads, vec![""]);
    }
}
