//! Built-in Collectors
//!
//! Ships the stock `time` collector: runs the job's command through the
//! shell and records wall-clock runtimes as profile resources. Third-party
//! collectors register the same way via `inventory::submit!`.

use fluxprof_core::{CollectorDef, ParamBag, PhaseReport, UnitKind};
use serde_json::{json, Value};
use std::process::Command;
use std::time::Instant;

/// Number of timed runs when the unit has no `repeat` parameter.
const DEFAULT_REPEAT: u64 = 3;

fn time_collect(params: &ParamBag) -> PhaseReport {
    let field = |key: &str| {
        params
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let cmd = field("cmd");
    if cmd.is_empty() {
        return PhaseReport::error(UnitKind::Collector, "no command to measure");
    }

    let command_line = [cmd.clone(), field("args"), field("workload")]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let repeat = params
        .get("repeat")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_REPEAT)
        .max(1);

    let mut resources = Vec::with_capacity(repeat as usize);
    for _ in 0..repeat {
        let started = Instant::now();
        let status = match Command::new("sh").arg("-c").arg(&command_line).status() {
            Ok(status) => status,
            Err(e) => {
                return PhaseReport::error(
                    UnitKind::Collector,
                    format!("failed to run '{command_line}': {e}"),
                );
            }
        };
        let elapsed = started.elapsed().as_secs_f64();

        if !status.success() {
            return PhaseReport::error(
                UnitKind::Collector,
                format!(
                    "'{}' exited with: {}",
                    command_line,
                    status.code().unwrap_or(-1)
                ),
            );
        }

        resources.push(json!({
            "amount": elapsed,
            "uid": cmd,
            "type": "time",
        }));
    }

    let mut updates = ParamBag::new();
    updates.insert(
        "profile".into(),
        json!({
            "resource_type": "time",
            "resources": resources,
        }),
    );
    PhaseReport::ok(UnitKind::Collector).with_updates(updates)
}

inventory::submit! {
    CollectorDef {
        name: "time",
        before: None,
        collect: Some(time_collect),
        after: None,
    }
}
