use std::path::PathBuf;

use anyhow::Result;
use pkgsync_resolver::DeviceProfile;
use pkgsync_updater::UpdaterConfig;

use crate::command_flows::{run_plan_command, run_status_command};
use crate::render::{current_output_style, format_plan_lines, format_status_lines};
use crate::{Cli, Commands};

const DEFAULT_STATE_DIR: &str = ".pkgsync";

pub(crate) async fn run_cli(cli: Cli, config: UpdaterConfig) -> Result<()> {
    let style = current_output_style();

    match cli.command {
        Commands::Plan {
            catalog,
            inventory,
            platform_level,
            abi,
        } => {
            let profile = DeviceProfile {
                platform_level,
                abis: abi,
            };
            let result = run_plan_command(&catalog, &inventory, &config, profile).await?;
            for line in format_plan_lines(&result, style) {
                println!("{line}");
            }
        }
        Commands::Status { state_dir } => {
            let state_dir = state_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
            let settings = run_status_command(&state_dir)?;
            for line in format_status_lines(&settings, &config.retry, style) {
                println!("{line}");
            }
        }
    }

    Ok(())
}
