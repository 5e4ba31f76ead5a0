//! Invocation of external tools (siege, siege.config, ps).
//!
//! All calls block until the child exits. No timeout is applied here; siege
//! bounds itself with `-t`.

use crate::config::BenchConfig;
use crate::types::OpsError;
use std::fmt;
use std::process::Command;
use tracing::{debug, info};

/// A program plus its argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable exit description for error messages.
    pub fn describe_exit(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external commands. Swapped for a fake in tests.
pub trait CommandRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput, OpsError>;
}

/// Runs commands on the host with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput, OpsError> {
        debug!(command = %cmd, "spawning");
        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .output()
            .map_err(|e| OpsError::ExternalTool {
                tool: cmd.program.clone(),
                reason: e.to_string(),
            })?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// `siege -c<concurrency> -t<duration> <host>:<port><query>`
pub fn siege_command(cfg: &BenchConfig) -> ToolCommand {
    ToolCommand::new(
        "siege",
        [
            format!("-c{}", cfg.concurrency),
            format!("-t{}", cfg.duration),
            cfg.target_url(),
        ],
    )
}

/// Asks siege to write its own default `~/.siege/siege.conf`.
pub fn siege_bootstrap_command() -> ToolCommand {
    ToolCommand::new("siege.config", Vec::<String>::new())
}

/// Runs siege against the configured target and returns whatever it produced.
///
/// A non-zero exit from siege is returned as-is; only a failure to spawn
/// siege at all is an error.
pub fn run_benchmark(runner: &dyn CommandRunner, cfg: &BenchConfig) -> Result<ToolOutput, OpsError> {
    let cmd = siege_command(cfg);
    info!(command = %cmd, "starting benchmark");
    let output = runner.run(&cmd)?;
    info!(exit = %output.describe_exit(), "benchmark finished");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recording {
        seen: RefCell<Vec<ToolCommand>>,
        reply: ToolOutput,
    }

    impl CommandRunner for Recording {
        fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput, OpsError> {
            self.seen.borrow_mut().push(cmd.clone());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn siege_command_matches_legacy_invocation() {
        let cfg = BenchConfig::for_home("/home/bench");
        assert_eq!(
            siege_command(&cfg).to_string(),
            "siege -c1000 -t1M 127.0.0.1:80/?q=word"
        );
        assert_eq!(
            siege_command(&cfg.tuned()).to_string(),
            "siege -c255 -t1M 127.0.0.1:80/?q=word"
        );
    }

    #[test]
    fn bootstrap_command_has_no_arguments() {
        let cmd = siege_bootstrap_command();
        assert_eq!(cmd.program, "siege.config");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn benchmark_surfaces_nonzero_exit_without_failing() {
        let runner = Recording {
            seen: RefCell::new(Vec::new()),
            reply: ToolOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "[error] socket: connection refused".into(),
            },
        };
        let cfg = BenchConfig::for_home("/home/bench");

        let output = run_benchmark(&runner, &cfg).unwrap();

        assert!(!output.success());
        assert_eq!(output.describe_exit(), "exit status 1");
        assert_eq!(runner.seen.borrow().len(), 1);
        assert_eq!(runner.seen.borrow()[0].program, "siege");
    }

    #[test]
    fn system_runner_captures_output_and_status() {
        let cmd = ToolCommand::new("sh", ["-c", "echo hello; echo oops >&2; exit 3"]);
        let output = SystemRunner.run(&cmd).unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let cmd = ToolCommand::new("definitely-not-a-real-binary-4821", Vec::<String>::new());
        match SystemRunner.run(&cmd) {
            Err(OpsError::ExternalTool { tool, .. }) => {
                assert_eq!(tool, "definitely-not-a-real-binary-4821")
            }
            other => panic!("expected ExternalTool error, got {:?}", other),
        }
    }
}
