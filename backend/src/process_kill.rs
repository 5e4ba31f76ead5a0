//! Process killing functionality.

use crate::process_list::{match_lines, ProcessLister};
use crate::types::OpsError;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

/// Delivers a termination signal to a pid.
pub trait Signaller {
    fn kill(&self, pid: i32) -> Result<(), OpsError>;
}

/// Sends `SIGKILL` through `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NixSignaller;

impl Signaller for NixSignaller {
    fn kill(&self, pid: i32) -> Result<(), OpsError> {
        kill_pid(pid)
    }
}

/// Kill a process by PID with `SIGKILL`. No graceful stop is attempted.
pub fn kill_pid(pid: i32) -> Result<(), OpsError> {
    match signal::kill(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(OpsError::ProcessNotFound(pid)),
        Err(Errno::EPERM) => Err(OpsError::PermissionDenied(pid)),
        Err(e) => Err(OpsError::SignalError(pid, e.to_string())),
    }
}

/// Outcome of one reaper pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// Pids that were signalled, in listing order.
    pub killed: Vec<i32>,
    /// Pids that exited between the snapshot and the signal.
    pub vanished: Vec<i32>,
    /// Matching lines whose pid could not be parsed.
    pub skipped: Vec<String>,
}

/// Kills every process whose listing line contains `marker`.
///
/// `on_kill` runs right after each successful signal, before the next entry
/// is looked at, so pids killed before a fatal error are still announced.
/// Unparseable lines and processes that are already gone are logged and
/// skipped. Any other failure aborts the pass. The calling process is never
/// signalled even if its own line matches.
pub fn reap(
    lister: &dyn ProcessLister,
    signaller: &dyn Signaller,
    marker: &str,
    on_kill: &mut dyn FnMut(i32),
) -> Result<ReapReport, OpsError> {
    let listing = lister.listing()?;
    let own_pid = std::process::id() as i32;
    let mut report = ReapReport::default();

    for entry in match_lines(&listing, marker) {
        let proc_info = match entry {
            Ok(info) => info,
            Err(OpsError::Parse(line)) => {
                warn!(line = line.as_str(), "skipping listing line without a numeric pid");
                report.skipped.push(line);
                continue;
            }
            Err(e) => return Err(e),
        };

        if proc_info.pid == own_pid {
            debug!(pid = own_pid, "not signalling self");
            continue;
        }

        match signaller.kill(proc_info.pid) {
            Ok(()) => {
                info!(pid = proc_info.pid, "kill pid");
                on_kill(proc_info.pid);
                report.killed.push(proc_info.pid);
            }
            Err(OpsError::ProcessNotFound(pid)) => {
                warn!(pid, "process exited before it could be killed");
                report.vanished.push(pid);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process_list::FixtureLister;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct RecordingSignaller {
        sent: RefCell<Vec<i32>>,
        failures: HashMap<i32, fn(i32) -> OpsError>,
    }

    impl Signaller for RecordingSignaller {
        fn kill(&self, pid: i32) -> Result<(), OpsError> {
            if let Some(make_err) = self.failures.get(&pid) {
                return Err(make_err(pid));
            }
            self.sent.borrow_mut().push(pid);
            Ok(())
        }
    }

    struct BrokenLister;

    impl ProcessLister for BrokenLister {
        fn listing(&self) -> Result<String, OpsError> {
            Err(OpsError::ExternalTool {
                tool: "ps".into(),
                reason: "No such file or directory".into(),
            })
        }
    }

    const LISTING: &str = "  PID TTY          TIME CMD\n\
 1234 ?        00:00:01 word_finder_master\n\
 5678 ?        00:00:00 unrelated_process\n\
 9012 ?        00:00:03 word_finder_worker\n";

    #[test]
    fn kills_only_matching_pids_in_order() {
        let signaller = RecordingSignaller::default();
        let report = reap(&FixtureLister::new(LISTING), &signaller, "word_finder", &mut |_| {}).unwrap();

        assert_eq!(*signaller.sent.borrow(), vec![1234, 9012]);
        assert_eq!(report.killed, vec![1234, 9012]);
        assert!(report.vanished.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn corrupted_pid_is_skipped_and_rest_processed() {
        let listing = " 12a4 ? 00:00:01 word_finder_master\n 9012 ? 00:00:03 word_finder_worker\n";
        let signaller = RecordingSignaller::default();

        let report = reap(&FixtureLister::new(listing), &signaller, "word_finder", &mut |_| {}).unwrap();

        assert_eq!(report.killed, vec![9012]);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].contains("12a4"));
    }

    #[test]
    fn vanished_process_is_not_fatal() {
        let mut signaller = RecordingSignaller::default();
        signaller
            .failures
            .insert(1234, OpsError::ProcessNotFound as fn(i32) -> OpsError);

        let report = reap(&FixtureLister::new(LISTING), &signaller, "word_finder", &mut |_| {}).unwrap();

        assert_eq!(report.vanished, vec![1234]);
        assert_eq!(report.killed, vec![9012]);
    }

    #[test]
    fn permission_denied_aborts() {
        let mut signaller = RecordingSignaller::default();
        signaller
            .failures
            .insert(1234, OpsError::PermissionDenied as fn(i32) -> OpsError);

        let err = reap(&FixtureLister::new(LISTING), &signaller, "word_finder", &mut |_| {}).unwrap_err();

        assert!(matches!(err, OpsError::PermissionDenied(1234)));
        assert!(signaller.sent.borrow().is_empty());
    }

    #[test]
    fn kills_before_a_fatal_error_are_still_announced() {
        let mut signaller = RecordingSignaller::default();
        signaller
            .failures
            .insert(9012, OpsError::PermissionDenied as fn(i32) -> OpsError);
        let mut announced = Vec::new();

        let result = reap(
            &FixtureLister::new(LISTING),
            &signaller,
            "word_finder",
            &mut |pid| announced.push(pid),
        );

        assert!(matches!(result, Err(OpsError::PermissionDenied(9012))));
        assert_eq!(*signaller.sent.borrow(), vec![1234]);
        assert_eq!(announced, vec![1234]);
    }

    #[test]
    fn listing_failure_is_fatal() {
        let signaller = RecordingSignaller::default();
        let err = reap(&BrokenLister, &signaller, "word_finder", &mut |_| {}).unwrap_err();
        assert!(matches!(err, OpsError::ExternalTool { .. }));
    }

    #[test]
    fn never_signals_self() {
        let me = std::process::id();
        let listing = format!("{} ? 00:00:00 word_finder_reaper\n", me);
        let signaller = RecordingSignaller::default();

        let report = reap(&FixtureLister::new(listing), &signaller, "word_finder", &mut |_| {}).unwrap();

        assert!(report.killed.is_empty());
        assert!(signaller.sent.borrow().is_empty());
    }

    #[test]
    fn kill_pid_reports_missing_process() {
        // Pids above the kernel's pid_max (at most 2^22) never exist.
        let err = kill_pid(i32::MAX - 1).unwrap_err();
        assert!(matches!(err, OpsError::ProcessNotFound(_)));
    }
}
