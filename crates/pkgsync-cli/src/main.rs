use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pkgsync_updater::UpdaterConfig;

mod command_flows;
mod dispatch;
mod dry_run;
mod logging;
mod render;

#[derive(Parser, Debug)]
#[command(name = "pkgsync")]
#[command(about = "Catalog-driven package update orchestrator", long_about = None)]
struct Cli {
    /// Updater config file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show which updates one cycle would install, in order.
    Plan {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        inventory: PathBuf,
        #[arg(long)]
        platform_level: Option<u32>,
        /// Supported native ABI; repeat for several.
        #[arg(long)]
        abi: Vec<String>,
    },
    /// Print the last-sync marker and retry counter.
    Status {
        #[arg(long)]
        state_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => UpdaterConfig::load(path)?,
        None => UpdaterConfig::default(),
    };
    logging::init(config.logging.filter.as_deref());

    dispatch::run_cli(cli, config).await
}

#[cfg(test)]
mod tests;
