#![warn(missing_docs)]
//! FluxProf CLI Library
//!
//! This crate provides the command-line infrastructure around the profile
//! collection pipeline: configuration loading, job matrix construction,
//! unit execution, and the revision replay loop.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     fluxprof_cli::run()
//! }
//! ```

mod collect;
mod commands;
mod config;
mod executor;
mod matrix;
mod postprocess;
mod vcs;

pub use commands::{run_command_list, CommandError};
pub use config::*;
pub use executor::{
    run_collector, run_matrix_jobs, run_matrix_on_workdir, run_postprocessor,
    run_postprocessor_on_profile, run_prephase_commands, History, RunStats,
};
pub use matrix::{build_job_matrix, CmdJobs, JobMatrix, JobSpecification, WorkloadJobs};
pub use vcs::{resolve_minor_versions, CleanState, GitVcs, SavedState, Vcs, VcsError};

use clap::{Parser, Subcommand};
use fluxprof_core::{ParamBag, RegistryResolver};
use fluxprof_store::PendingStore;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// FluxProf CLI arguments
#[derive(Parser, Debug)]
#[command(name = "fluxprof")]
#[command(author, version, about = "FluxProf - performance profile collection over project history")]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Path to fluxprof.toml (discovered by walking up when omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the configured job matrix, optionally across a list of revisions
    Matrix {
        /// Revisions to replay, in order (defaults to the current head)
        #[arg(short = 'm', long = "minor-version")]
        minor_versions: Vec<String>,

        /// Print per-revision history while replaying
        #[arg(long)]
        with_history: bool,
    },
    /// Run a single ad-hoc job given on the command line
    Job {
        /// Target command(s) to measure
        #[arg(long = "cmd", required = true)]
        cmds: Vec<String>,

        /// Argument variants
        #[arg(long = "args")]
        args: Vec<String>,

        /// Workloads
        #[arg(long = "workload")]
        workloads: Vec<String>,

        /// Collector unit name(s); parameters come from configuration
        #[arg(long = "collector", required = true)]
        collectors: Vec<String>,

        /// Postprocessor unit name(s), applied in the given order
        #[arg(long = "postprocessor")]
        postprocessors: Vec<String>,

        /// Revisions to replay, in order (defaults to the current head)
        #[arg(short = 'm', long = "minor-version")]
        minor_versions: Vec<String>,

        /// Print per-revision history while replaying
        #[arg(long)]
        with_history: bool,
    },
    /// Apply a postprocessor to an already stored profile
    Postprocess {
        /// Path to the stored profile
        profile: PathBuf,

        /// Registered postprocessor name
        postprocessor: String,

        /// Unit parameters as an inline JSON object
        #[arg(long)]
        params: Option<String>,
    },
    /// Write a default fluxprof.toml into the current directory
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

/// Run the FluxProf CLI with arguments from the environment.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(Cli::parse())
}

/// Run the FluxProf CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("fluxprof=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("fluxprof=info")
            .init();
    }

    let config = match &cli.config {
        Some(path) => FluxProfConfig::load(path)?,
        None => FluxProfConfig::discover().unwrap_or_default(),
    };

    match cli.command {
        Commands::Matrix {
            ref minor_versions,
            with_history,
        } => {
            let spec = JobSpecification::from_config(&config)?;
            execute_spec(&config, &spec, minor_versions, with_history)
        }
        Commands::Job {
            ref cmds,
            ref args,
            ref workloads,
            ref collectors,
            ref postprocessors,
            ref minor_versions,
            with_history,
        } => {
            let spec = single_job_spec(
                &config,
                cmds.clone(),
                args.clone(),
                workloads.clone(),
                collectors.clone(),
                postprocessors.clone(),
            );
            execute_spec(&config, &spec, minor_versions, with_history)
        }
        Commands::Postprocess {
            ref profile,
            ref postprocessor,
            ref params,
        } => postprocess_stored_profile(&config, profile, postprocessor, params.as_deref()),
        Commands::Init { force } => init_config(force),
    }
}

/// Build a job specification for an ad-hoc job given on the command line.
///
/// Unit parameters are still looked up in configuration by unit name, so a
/// CLI-run collector behaves exactly like its configured counterpart.
fn single_job_spec(
    config: &FluxProfConfig,
    cmds: Vec<String>,
    args: Vec<String>,
    workloads: Vec<String>,
    collectors: Vec<String>,
    postprocessors: Vec<String>,
) -> JobSpecification {
    let params_of = |units: &[UnitConfig], names: &[String]| -> BTreeMap<String, ParamBag> {
        names
            .iter()
            .filter_map(|name| {
                units
                    .iter()
                    .find(|u| &u.name == name)
                    .map(|u| (name.clone(), u.params.clone()))
            })
            .collect()
    };

    JobSpecification {
        collector_params: params_of(&config.jobs.collectors, &collectors),
        postprocessor_params: params_of(&config.jobs.postprocessors, &postprocessors),
        cmds,
        args,
        workloads: if workloads.is_empty() {
            vec![String::new()]
        } else {
            workloads
        },
        collectors,
        postprocessors,
    }
}

/// Build the matrix for a specification and replay it over the requested
/// revisions.
fn execute_spec(
    config: &FluxProfConfig,
    spec: &JobSpecification,
    minor_versions: &[String],
    with_history: bool,
) -> anyhow::Result<()> {
    let (job_matrix, total_steps) = build_job_matrix(spec);
    let vcs = GitVcs::new(std::env::current_dir()?);
    let revisions = resolve_minor_versions(&vcs, minor_versions)?;
    let store = PendingStore::open(&config.store.directory)?;

    run_matrix_jobs(
        &vcs,
        &RegistryResolver,
        &store,
        config,
        &job_matrix,
        total_steps,
        &revisions,
        with_history,
    )
}

/// Handle the `postprocess` subcommand.
fn postprocess_stored_profile(
    config: &FluxProfConfig,
    profile_path: &PathBuf,
    postprocessor: &str,
    params: Option<&str>,
) -> anyhow::Result<()> {
    let profile = PendingStore::load_profile(profile_path)?;
    let params: ParamBag = match params {
        Some(raw) => serde_json::from_str(raw)?,
        None => ParamBag::new(),
    };

    let store = PendingStore::open(&config.store.directory)?;
    let status = run_postprocessor_on_profile(
        &RegistryResolver,
        &store,
        profile,
        postprocessor,
        params,
        config.profiles.register_after_run,
    )?;

    if status != fluxprof_core::PostprocessStatus::Ok {
        anyhow::bail!("postprocessing of {} failed", profile_path.display());
    }
    Ok(())
}

/// Handle the `init` subcommand.
fn init_config(force: bool) -> anyhow::Result<()> {
    let path = PathBuf::from("fluxprof.toml");
    if path.exists() && !force {
        anyhow::bail!("fluxprof.toml already exists (use --force to overwrite)");
    }
    std::fs::write(&path, FluxProfConfig::default_toml())?;
    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cli_parses_matrix_command() {
        let cli = Cli::try_parse_from([
            "fluxprof",
            "matrix",
            "-m",
            "abc",
            "-m",
            "def",
            "--with-history",
        ])
        .unwrap();

        match cli.command {
            Commands::Matrix {
                minor_versions,
                with_history,
            } => {
                assert_eq!(minor_versions, ["abc", "def"]);
                assert!(with_history);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_requires_collector_for_job() {
        let result = Cli::try_parse_from(["fluxprof", "job", "--cmd", "bin"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_single_job_spec_takes_params_from_config() {
        let mut config = FluxProfConfig::default();
        let mut params = ParamBag::new();
        params.insert("warmup".into(), json!(5));
        config.jobs.collectors.push(UnitConfig {
            name: "time".to_string(),
            params,
        });

        let spec = single_job_spec(
            &config,
            vec!["bin".to_string()],
            Vec::new(),
            Vec::new(),
            vec!["time".to_string()],
            Vec::new(),
        );

        assert_eq!(spec.workloads, vec![""]);
        assert_eq!(spec.collector_params["time"]["warmup"], 5);

        let (matrix, total_steps) = build_job_matrix(&spec);
        assert_eq!(total_steps, 1);
        assert_eq!(
            matrix.groups[0].workloads[0].jobs[0].collector.params["warmup"],
            5
        );
    }
}
