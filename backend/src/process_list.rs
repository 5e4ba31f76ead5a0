//! Process listing snapshots and marker matching.
//!
//! A listing is plain text with one process per line and the pid as the first
//! whitespace-delimited token, which is what `ps -A` prints. `PsLister` is the
//! default source. `ProcfsLister` is an alternate source, selected with
//! `REAPER_SOURCE=procfs`, that renders the same shape from `/proc` so both go
//! through one matcher.

use crate::external::{CommandRunner, SystemRunner, ToolCommand};
use crate::types::{OpsError, ProcessInfo};
use std::fmt::Write;

/// Produces a fresh snapshot of the host's process table.
pub trait ProcessLister {
    fn listing(&self) -> Result<String, OpsError>;
}

/// Lists processes by running `ps -A`.
pub struct PsLister<R: CommandRunner = SystemRunner> {
    runner: R,
}

impl PsLister<SystemRunner> {
    pub fn new() -> Self {
        Self {
            runner: SystemRunner,
        }
    }
}

impl Default for PsLister<SystemRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> PsLister<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    pub fn command() -> ToolCommand {
        ToolCommand::new("ps", ["-A"])
    }
}

impl<R: CommandRunner> ProcessLister for PsLister<R> {
    fn listing(&self) -> Result<String, OpsError> {
        let cmd = Self::command();
        let output = self.runner.run(&cmd)?;
        if !output.success() {
            return Err(OpsError::ExternalTool {
                tool: cmd.program,
                reason: format!("{}: {}", output.describe_exit(), output.stderr.trim()),
            });
        }
        Ok(output.stdout)
    }
}

/// Alternate source: lists processes straight from `/proc`, one
/// `"<pid> <comm>"` line each. `PsLister` is used unless this is asked for.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcfsLister;

impl ProcessLister for ProcfsLister {
    fn listing(&self) -> Result<String, OpsError> {
        let all_procs = procfs::process::all_processes()
            .map_err(|e| OpsError::ProcfsError(format!("Failed to read /proc: {}", e)))?;

        let mut out = String::new();
        // Processes can exit mid-scan; those entries are simply not listed.
        for proc in all_procs.flatten() {
            if let Ok(stat) = proc.stat() {
                let _ = writeln!(out, "{} {}", stat.pid, stat.comm);
            }
        }
        Ok(out)
    }
}

/// A canned listing, for tests and dry runs.
#[derive(Debug, Clone)]
pub struct FixtureLister {
    text: String,
}

impl FixtureLister {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl ProcessLister for FixtureLister {
    fn listing(&self) -> Result<String, OpsError> {
        Ok(self.text.clone())
    }
}

/// Parses the leading whitespace-delimited token of `line` as a pid.
pub fn parse_pid(line: &str) -> Result<i32, OpsError> {
    line.split_whitespace()
        .next()
        .and_then(|token| token.parse::<i32>().ok())
        .filter(|pid| *pid > 0)
        .ok_or_else(|| OpsError::Parse(line.to_string()))
}

/// Returns one entry per line containing `marker`, in listing order.
/// Lines whose pid cannot be parsed come back as `Err(OpsError::Parse)`.
pub fn match_lines(listing: &str, marker: &str) -> Vec<Result<ProcessInfo, OpsError>> {
    listing
        .lines()
        .filter(|line| line.contains(marker))
        .map(|line| {
            parse_pid(line).map(|pid| ProcessInfo {
                pid,
                line: line.to_string(),
            })
        })
        .collect()
}
