use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use pkgsync_core::{
    AttentionNotifier, ConfirmationHandle, ConfirmationPresenter, InstallOptions, InstallOutcome,
    Installer, InstallerResponse, ManualConfirmation, PackageVersion, PayloadFetcher,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::payload::{discard_payload, verify_payload, PayloadError};
use crate::recovery::reconstruct_confirmations;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub require_user_action: bool,
    #[serde(default = "default_verify_payload")]
    pub verify_payload: bool,
}

fn default_verify_payload() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            require_user_action: false,
            verify_payload: default_verify_payload(),
        }
    }
}

impl SessionConfig {
    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            require_user_action: self.require_user_action,
        }
    }
}

/// Owns the set of installs parked on a user confirmation.
///
/// Keyed by package name; at most one pending confirmation per package. The
/// set lives in memory and is rebuilt from the installer's live transactions
/// whenever the process restarted in between.
pub struct SessionManager {
    installer: Arc<dyn Installer>,
    fetcher: Arc<dyn PayloadFetcher>,
    notifier: Arc<dyn AttentionNotifier>,
    config: SessionConfig,
    confirmations: Mutex<BTreeMap<String, ManualConfirmation>>,
    foreground: Mutex<Option<Arc<dyn ConfirmationPresenter>>>,
}

impl SessionManager {
    pub fn new(
        installer: Arc<dyn Installer>,
        fetcher: Arc<dyn PayloadFetcher>,
        notifier: Arc<dyn AttentionNotifier>,
        config: SessionConfig,
    ) -> Self {
        Self {
            installer,
            fetcher,
            notifier,
            config,
            confirmations: Mutex::new(BTreeMap::new()),
            foreground: Mutex::new(None),
        }
    }

    /// Attaches the presenter of a visible UI. While set, confirmation
    /// requests are shown right away instead of being queued.
    pub fn set_foreground_presenter(&self, presenter: Option<Arc<dyn ConfirmationPresenter>>) {
        *self.foreground.lock() = presenter;
    }

    /// Fetches, verifies and installs one version. Never fails: every
    /// collaborator error is folded into the returned outcome.
    pub async fn install(&self, package: &str, version: &PackageVersion) -> InstallOutcome {
        let payload = match self.fetcher.fetch(package, version).await {
            Ok(path) => path,
            Err(err) => {
                let err = PayloadError::Fetch {
                    package: package.to_string(),
                    reason: format!("{err:#}"),
                };
                warn!(package, version_code = %version.version_code, "{err}");
                return InstallOutcome::TransientFailure(err.to_string());
            }
        };

        let outcome = self.install_payload(package, version, &payload).await;
        discard_payload(&payload).await;
        outcome
    }

    async fn install_payload(
        &self,
        package: &str,
        version: &PackageVersion,
        payload: &Path,
    ) -> InstallOutcome {
        if self.config.verify_payload {
            if let Err(err) = verify_payload(payload, &version.payload).await {
                warn!(package, version_code = %version.version_code, "{err}");
                return InstallOutcome::TransientFailure(err.to_string());
            }
        }

        info!(
            package,
            version = %version.display_name(),
            "installing update"
        );
        let options = self.config.install_options();
        let response = match self.installer.install(package, payload, &options).await {
            Ok(response) => response,
            Err(err) => {
                warn!(package, error = %format!("{err:#}"), "installer failed");
                return InstallOutcome::TransientFailure(format!("{err:#}"));
            }
        };

        match response {
            InstallerResponse::Installed => InstallOutcome::Success,
            InstallerResponse::Rejected { status, message } => {
                let reason = match message {
                    Some(message) => format!("status {status}: {message}"),
                    None => format!("status {status}"),
                };
                warn!(package, %reason, "installer rejected update");
                InstallOutcome::PermanentFailure(reason)
            }
            InstallerResponse::ConfirmationRequired(handle) => {
                self.park_for_confirmation(package, version, handle)
            }
        }
    }

    fn park_for_confirmation(
        &self,
        package: &str,
        version: &PackageVersion,
        handle: ConfirmationHandle,
    ) -> InstallOutcome {
        let transaction_id = handle.transaction_id();
        let foreground = self.foreground.lock().clone();
        if let Some(presenter) = foreground {
            info!(package, %transaction_id, "showing confirmation prompt");
            presenter.present(package, &handle);
            return InstallOutcome::PromptShown(transaction_id);
        }

        info!(package, %transaction_id, "update waits for user confirmation");
        self.confirmations.lock().insert(
            package.to_string(),
            ManualConfirmation {
                package: package.to_string(),
                version: Some(version.version_code),
                transaction_id,
                handle,
            },
        );
        InstallOutcome::ConfirmationPending(transaction_id)
    }

    /// True when `package` is parked on a confirmation, either known to this
    /// instance or found among the installer's live transactions. Only the
    /// queried package is adopted from the installer; other sealed
    /// transactions stay unreferenced so cleanup can still reach them.
    pub async fn has_active_confirmation(&self, package: &str) -> bool {
        if self.confirmations.lock().contains_key(package) {
            return true;
        }

        let Some(confirmation) = self.recovered_confirmations().await.remove(package) else {
            return false;
        };
        debug!(
            package,
            transaction_id = %confirmation.transaction_id,
            "recovered pending confirmation from installer"
        );
        self.confirmations
            .lock()
            .entry(package.to_string())
            .or_insert(confirmation);
        true
    }

    /// Replays every pending confirmation to `presenter` and clears the set.
    /// Returns how many prompts were presented.
    pub async fn on_user_attention_available(&self, presenter: &dyn ConfirmationPresenter) -> usize {
        if self.confirmations.lock().is_empty() {
            let recovered = self.recovered_confirmations().await;
            let mut confirmations = self.confirmations.lock();
            for (name, confirmation) in recovered {
                confirmations.entry(name).or_insert(confirmation);
            }
        }

        let pending = std::mem::take(&mut *self.confirmations.lock());
        for confirmation in pending.values() {
            info!(
                package = %confirmation.package,
                transaction_id = %confirmation.transaction_id,
                "opening confirmation prompt"
            );
            presenter.present(&confirmation.package, &confirmation.handle);
        }
        self.notifier.cancel_confirmation_required();
        pending.len()
    }

    /// Abandons every committed transaction no pending confirmation refers to.
    /// Returns how many were abandoned.
    pub async fn abandon_stale_sessions(&self) -> usize {
        let transactions = match self.installer.live_transactions().await {
            Ok(transactions) => transactions,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed listing live transactions for cleanup");
                return 0;
            }
        };
        let referenced: BTreeSet<_> = self
            .confirmations
            .lock()
            .values()
            .map(|confirmation| confirmation.transaction_id)
            .collect();

        let mut abandoned = 0;
        for transaction in transactions {
            if !transaction.committed || referenced.contains(&transaction.id) {
                continue;
            }
            match self.installer.abandon(transaction.id).await {
                Ok(()) => {
                    debug!(transaction_id = %transaction.id, "abandoned stale transaction");
                    abandoned += 1;
                }
                Err(err) => warn!(
                    transaction_id = %transaction.id,
                    error = %format!("{err:#}"),
                    "failed abandoning stale transaction"
                ),
            }
        }
        if abandoned > 0 {
            info!(abandoned, "cleaned up stale transactions");
        }
        abandoned
    }

    /// Snapshot of the pending confirmations, ordered by package name.
    pub fn pending_confirmations(&self) -> Vec<ManualConfirmation> {
        self.confirmations.lock().values().cloned().collect()
    }

    async fn recovered_confirmations(&self) -> BTreeMap<String, ManualConfirmation> {
        match self.installer.live_transactions().await {
            Ok(transactions) => reconstruct_confirmations(&transactions),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed listing live transactions");
                BTreeMap::new()
            }
        }
    }
}
