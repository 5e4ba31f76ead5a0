//! UI-agnostic operations library for benchmarking and cleaning up word_finder.
//!
//! Provides siege.conf reconciliation, siege invocation, process listing and
//! marker-based process killing. Uses `nix` and `procfs` for system interaction.

pub mod config;
pub mod external;
mod process_kill;
mod process_list;
pub mod siege_conf;
mod types;

pub use config::{BenchConfig, ListingSource, ReapConfig};
pub use external::{run_benchmark, CommandRunner, SystemRunner, ToolCommand, ToolOutput};
pub use process_kill::{kill_pid, reap, NixSignaller, ReapReport, Signaller};
pub use process_list::{
    match_lines, parse_pid, FixtureLister, ProcessLister, ProcfsLister, PsLister,
};
pub use siege_conf::{reconcile, Bootstrap, LinePatch, ReconcileReport};
pub use types::{OpsError, ProcessInfo};
