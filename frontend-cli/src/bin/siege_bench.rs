//! Writes a default siege.conf if none exists, then benchmarks word_finder.

use anyhow::Context;
use backend::siege_conf::DEFAULT_TEMPLATE;
use backend::{reconcile, run_benchmark, BenchConfig, Bootstrap, SystemRunner};
use frontend_cli::{echo_output, init_tracing};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = BenchConfig::from_env()?;
    let report = reconcile(
        &cfg.conf_path,
        &Bootstrap::Template(DEFAULT_TEMPLATE.to_string()),
        &[],
        &SystemRunner,
    )
    .with_context(|| format!("preparing {}", cfg.conf_path.display()))?;
    info!(created = report.created, "siege config ready");

    let output = run_benchmark(&SystemRunner, &cfg)?;
    echo_output(&output)?;
    Ok(())
}
