//! Shell Command Lists
//!
//! Executes the configured pre-phase command lists. Commands run through
//! the shell one at a time; the first failure stops the list and reports
//! the failing command with its exit code and captured output.

use std::process::Command;
use thiserror::Error;

/// A command in a phase list failed.
#[derive(Debug, Error)]
#[error("command '{command}' exited with: {code} ({output})")]
pub struct CommandError {
    /// The command text as configured
    pub command: String,
    /// Exit code, -1 when the process could not be spawned or was killed
    pub code: i32,
    /// Captured stdout and stderr of the failing command
    pub output: String,
}

/// Run an ordered list of shell commands, stopping at the first failure.
pub fn run_command_list(commands: &[String]) -> Result<(), CommandError> {
    for command in commands {
        run_shell_command(command)?;
    }
    Ok(())
}

fn run_shell_command(command: &str) -> Result<(), CommandError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .map_err(|e| CommandError {
            command: command.to_string(),
            code: -1,
            output: e.to_string(),
        })?;

    if output.status.success() {
        return Ok(());
    }

    let mut captured = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !captured.is_empty() {
            captured.push('\n');
        }
        captured.push_str(stderr.trim());
    }

    Err(CommandError {
        command: command.to_string(),
        code: output.status.code().unwrap_or(-1),
        output: captured,
    })
}
