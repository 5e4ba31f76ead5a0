//! Shared wiring for the command-line drivers.

use backend::{ListingSource, ProcessLister, ProcfsLister, PsLister, ToolOutput};
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber. Level is overridden by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Echoes a finished tool's captured streams to our own stdout and stderr.
pub fn echo_output(output: &ToolOutput) -> std::io::Result<()> {
    std::io::stdout().write_all(output.stdout.as_bytes())?;
    std::io::stderr().write_all(output.stderr.as_bytes())?;
    Ok(())
}

pub fn lister_for(source: ListingSource) -> Box<dyn ProcessLister> {
    match source {
        ListingSource::Ps => Box::new(PsLister::new()),
        ListingSource::Procfs => Box::new(ProcfsLister),
    }
}
