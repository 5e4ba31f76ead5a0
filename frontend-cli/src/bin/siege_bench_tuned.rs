//! Generates siege.conf with `siege.config` if needed, switches it to GET
//! requests in benchmark mode, then benchmarks word_finder.

use anyhow::Context;
use backend::external::siege_bootstrap_command;
use backend::siege_conf::TUNING_PATCHES;
use backend::{reconcile, run_benchmark, BenchConfig, Bootstrap, SystemRunner};
use frontend_cli::{echo_output, init_tracing};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = BenchConfig::from_env()?.tuned();
    let report = reconcile(
        &cfg.conf_path,
        &Bootstrap::Command(siege_bootstrap_command()),
        &TUNING_PATCHES,
        &SystemRunner,
    )
    .with_context(|| format!("reconciling {}", cfg.conf_path.display()))?;
    info!(
        created = report.created,
        replaced = report.replaced,
        "siege config ready"
    );

    let output = run_benchmark(&SystemRunner, &cfg)?;
    echo_output(&output)?;
    Ok(())
}
