use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::confirmation::{ConfirmationHandle, TransactionId, TransactionInfo};
use crate::model::{Catalog, PackageVersion, VersionCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstallOptions {
    /// When false the installer may skip the interactive prompt if platform
    /// policy allows it.
    #[serde(default)]
    pub require_user_action: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallerResponse {
    Installed,
    Rejected {
        status: i32,
        message: Option<String>,
    },
    ConfirmationRequired(ConfirmationHandle),
}

/// Byte-level install primitive. Does not support concurrent transactions.
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(
        &self,
        package: &str,
        payload: &Path,
        options: &InstallOptions,
    ) -> Result<InstallerResponse>;

    async fn live_transactions(&self) -> Result<Vec<TransactionInfo>>;

    /// Idempotent.
    async fn abandon(&self, id: TransactionId) -> Result<()>;
}

/// Transport for payload bytes. The returned file is handed over to the caller,
/// which removes it after the install attempt.
#[async_trait]
pub trait PayloadFetcher: Send + Sync {
    async fn fetch(&self, package: &str, version: &PackageVersion) -> Result<PathBuf>;
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Returns an already verified catalog joined with installed versions.
    async fn catalog(&self) -> Result<Catalog>;
}

pub trait UpdateSelector: Send + Sync {
    /// Best version to install given what is installed, or `None`.
    ///
    /// With `installed == None` this suggests the best version regardless of
    /// current state.
    fn suggest<'a>(
        &self,
        installed: Option<VersionCode>,
        available: &'a [PackageVersion],
    ) -> Option<&'a PackageVersion>;
}

pub trait LibraryInspector: Send + Sync {
    /// Highest installed version of the shared library, `None` when absent.
    fn shared_library_version(&self, library: &str) -> Result<Option<VersionCode>>;
}

pub trait ConfirmationPresenter: Send + Sync {
    fn present(&self, package: &str, handle: &ConfirmationHandle);
}

pub trait AttentionNotifier: Send + Sync {
    fn show_confirmation_required(&self);
    fn cancel_confirmation_required(&self);
}
