use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pkgsync_core::{CatalogProvider, CycleResult};
use pkgsync_installer::{SessionConfig, SessionManager};
use pkgsync_registry::FileCatalogProvider;
use pkgsync_resolver::{DeviceProfile, HighestCompatibleSelector};
use pkgsync_updater::{SettingsStore, UpdateOrchestrator, UpdateSettings, UpdaterConfig};
use tracing::debug;

use crate::dry_run::{DryRunFetcher, DryRunInstaller, LogNotifier};

/// Runs one cycle against the files with an installer that accepts
/// everything, so the result lists what a real cycle would attempt.
pub(crate) async fn run_plan_command(
    catalog: &Path,
    inventory: &Path,
    config: &UpdaterConfig,
    profile: DeviceProfile,
) -> Result<CycleResult> {
    let provider = Arc::new(FileCatalogProvider::new(catalog, inventory));
    let snapshot = provider.catalog().await?;
    debug!(
        timestamp = snapshot.timestamp,
        packages = snapshot.packages.len(),
        "planning against catalog"
    );

    let notifier = Arc::new(LogNotifier);
    let sessions = Arc::new(SessionManager::new(
        Arc::new(DryRunInstaller),
        Arc::new(DryRunFetcher::new()?),
        notifier.clone(),
        SessionConfig {
            verify_payload: false,
            ..config.install
        },
    ));
    let orchestrator = UpdateOrchestrator::new(
        sessions,
        Arc::new(HighestCompatibleSelector::new(profile)),
        provider,
        notifier,
        config.dependency_policy()?,
    );

    Ok(orchestrator.run_cycle(&snapshot).await)
}

pub(crate) fn run_status_command(state_dir: &Path) -> Result<UpdateSettings> {
    SettingsStore::new(state_dir)
        .load()
        .with_context(|| format!("failed reading update state in {}", state_dir.display()))
}
