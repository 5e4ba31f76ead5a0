//! Kills word_finder master and worker processes.

use anyhow::Context;
use backend::{reap, NixSignaller, ReapConfig};
use frontend_cli::{init_tracing, lister_for};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = ReapConfig::from_env();
    let lister = lister_for(cfg.source);
    let report = reap(lister.as_ref(), &NixSignaller, &cfg.marker, &mut |pid| {
        println!("kill pid: {}", pid)
    })
    .with_context(|| format!("killing processes matching {:?}", cfg.marker))?;

    info!(
        killed = report.killed.len(),
        vanished = report.vanished.len(),
        skipped = report.skipped.len(),
        "done"
    );
    Ok(())
}
