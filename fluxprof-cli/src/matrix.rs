//! Job Matrix Builder
//!
//! Expands the configured commands × argument variants × workloads ×
//! collectors cross product into the full set of jobs for one run, grouped
//! by command then workload for progress reporting.
//!
//! Grouping exists purely for human-readable output; both levels iterate in
//! configuration insertion order.

use crate::config::{FluxProfConfig, MissingSection, UnitConfig};
use fluxprof_core::{Job, ParamBag, Unit};
use std::collections::BTreeMap;

/// Everything the matrix builder needs, detached from its source
/// (configuration file or explicit CLI arguments).
#[derive(Debug, Clone, Default)]
pub struct JobSpecification {
    /// Target commands
    pub cmds: Vec<String>,
    /// Argument variants; empty means a single empty variant
    pub args: Vec<String>,
    /// Workloads
    pub workloads: Vec<String>,
    /// Collector names
    pub collectors: Vec<String>,
    /// Postprocessor names, in application order
    pub postprocessors: Vec<String>,
    /// Collector parameters keyed by unit name
    pub collector_params: BTreeMap<String, ParamBag>,
    /// Postprocessor parameters keyed by unit name
    pub postprocessor_params: BTreeMap<String, ParamBag>,
}

impl JobSpecification {
    /// Build the specification from loaded configuration.
    ///
    /// Fails naming the missing section when the configuration has no
    /// commands or no collectors; every other table defaults sensibly
    /// (workloads to a single empty workload, args to none).
    pub fn from_config(config: &FluxProfConfig) -> Result<Self, MissingSection> {
        if config.jobs.collectors.is_empty() {
            return Err(MissingSection("collectors"));
        }
        if config.jobs.cmds.is_empty() {
            return Err(MissingSection("cmds"));
        }

        let workloads = if config.jobs.workloads.is_empty() {
            vec![String::new()]
        } else {
            config.jobs.workloads.clone()
        };

        Ok(Self {
            cmds: config.jobs.cmds.clone(),
            args: config.jobs.args.clone(),
            workloads,
            collectors: unit_names(&config.jobs.collectors),
            postprocessors: unit_names(&config.jobs.postprocessors),
            collector_params: unit_params(&config.jobs.collectors),
            postprocessor_params: unit_params(&config.jobs.postprocessors),
        })
    }
}

fn unit_names(units: &[UnitConfig]) -> Vec<String> {
    units.iter().map(|u| u.name.clone()).collect()
}

fn unit_params(units: &[UnitConfig]) -> BTreeMap<String, ParamBag> {
    units
        .iter()
        .map(|u| (u.name.clone(), u.params.clone()))
        .collect()
}

/// Jobs for one workload of one command.
#[derive(Debug, Clone)]
pub struct WorkloadJobs {
    /// The workload all these jobs share
    pub workload: String,
    /// Jobs in cross-product order (collector outer, argument variant inner)
    pub jobs: Vec<Job>,
}

/// Jobs for one command, grouped by workload.
#[derive(Debug, Clone)]
pub struct CmdJobs {
    /// The target command all these jobs share
    pub cmd: String,
    /// Workload groups in configuration order
    pub workloads: Vec<WorkloadJobs>,
}

/// The full set of jobs for one run, grouped by command then workload.
///
/// Built once per run; read-only thereafter.
#[derive(Debug, Clone, Default)]
pub struct JobMatrix {
    /// Command groups in configuration order
    pub groups: Vec<CmdJobs>,
}

impl JobMatrix {
    /// Whether the matrix contains no jobs at all.
    pub fn is_empty(&self) -> bool {
        self.groups
            .iter()
            .all(|g| g.workloads.iter().all(|w| w.jobs.is_empty()))
    }

    /// Iterate every job in matrix order.
    pub fn iter_jobs(&self) -> impl Iterator<Item = &Job> {
        self.groups
            .iter()
            .flat_map(|g| g.workloads.iter())
            .flat_map(|w| w.jobs.iter())
    }
}

/// Construct the job matrix and the total step count for progress display.
///
/// Every `(cmd, workload)` entry is the cross product of the configured
/// collectors and argument variants; with no variants configured a single
/// empty variant is used, so each (cmd, workload, collector) still yields
/// exactly one job. All configured postprocessors attach identically to
/// every job. `total_steps` sums `1 + postprocessors` over all jobs and is
/// used only for display, never for control flow.
pub fn build_job_matrix(spec: &JobSpecification) -> (JobMatrix, u64) {
    let construct_unit = |name: &str, params: &BTreeMap<String, ParamBag>| {
        Unit::new(name, params.get(name).cloned().unwrap_or_default())
    };

    let collectors: Vec<Unit> = spec
        .collectors
        .iter()
        .map(|name| construct_unit(name, &spec.collector_params))
        .collect();
    let postprocessors: Vec<Unit> = spec
        .postprocessors
        .iter()
        .map(|name| construct_unit(name, &spec.postprocessor_params))
        .collect();

    let arg_variants: Vec<String> = if spec.args.is_empty() {
        vec![String::new()]
    } else {
        spec.args.clone()
    };

    let groups: Vec<CmdJobs> = spec
        .cmds
        .iter()
        .map(|cmd| CmdJobs {
            cmd: cmd.clone(),
            workloads: spec
                .workloads
                .iter()
                .map(|workload| WorkloadJobs {
                    workload: workload.clone(),
                    jobs: collectors
                        .iter()
                        .flat_map(|collector| {
                            arg_variants.iter().map(|args| Job {
                                collector: collector.clone(),
                                postprocessors: postprocessors.clone(),
                                cmd: cmd.clone(),
                                workload: workload.clone(),
                                args: args.clone(),
                            })
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    let matrix = JobMatrix { groups };
    let total_steps = matrix
        .iter_jobs()
        .map(|job| 1 + job.postprocessors.len() as u64)
        .sum();

    (matrix, total_steps)
}
