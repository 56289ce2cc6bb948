use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use pkgsync_core::{
    AttentionNotifier, InstallOptions, Installer, InstallerResponse, PackageVersion,
    PayloadFetcher, TransactionId, TransactionInfo,
};
use tempfile::TempDir;
use tracing::{debug, info};

/// Accepts every install without touching the system.
#[derive(Debug, Default)]
pub struct DryRunInstaller;

#[async_trait]
impl Installer for DryRunInstaller {
    async fn install(
        &self,
        package: &str,
        payload: &Path,
        _options: &InstallOptions,
    ) -> Result<InstallerResponse> {
        debug!(package, payload = %payload.display(), "dry run: would install");
        Ok(InstallerResponse::Installed)
    }

    async fn live_transactions(&self) -> Result<Vec<TransactionInfo>> {
        Ok(Vec::new())
    }

    async fn abandon(&self, _id: TransactionId) -> Result<()> {
        Ok(())
    }
}

/// Hands out empty placeholder payloads from a private scratch directory.
#[derive(Debug)]
pub struct DryRunFetcher {
    scratch: TempDir,
}

impl DryRunFetcher {
    pub fn new() -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("pkgsync-plan-")
            .tempdir()
            .context("failed creating dry run scratch directory")?;
        Ok(Self { scratch })
    }
}

#[async_trait]
impl PayloadFetcher for DryRunFetcher {
    async fn fetch(&self, package: &str, version: &PackageVersion) -> Result<PathBuf> {
        let path = self
            .scratch
            .path()
            .join(format!("{package}-{}", version.version_code));
        tokio::fs::write(&path, b"")
            .await
            .with_context(|| format!("failed writing placeholder {}", path.display()))?;
        Ok(path)
    }
}

#[derive(Debug, Default)]
pub struct LogNotifier;

impl AttentionNotifier for LogNotifier {
    fn show_confirmation_required(&self) {
        info!("updates wait for user confirmation");
    }

    fn cancel_confirmation_required(&self) {
        debug!("confirmation notice dismissed");
    }
}
