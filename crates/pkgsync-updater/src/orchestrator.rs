use std::collections::BTreeMap;
use std::sync::Arc;

use pkgsync_core::{
    AttentionNotifier, BlockReason, BlockedPackage, Catalog, CycleResult, InstallAttempt,
    InstallOutcome, LibraryInspector, PackageRecord, PackageVersion, UpdateSelector, VersionCode,
};
use pkgsync_installer::SessionManager;
use pkgsync_resolver::DependencyPolicy;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Decides which updates to install in one pass over the catalog and drives
/// them through the session manager, one install at a time.
pub struct UpdateOrchestrator {
    sessions: Arc<SessionManager>,
    selector: Arc<dyn UpdateSelector>,
    libraries: Arc<dyn LibraryInspector>,
    notifier: Arc<dyn AttentionNotifier>,
    policy: DependencyPolicy,
}

/// Whether a dependent may go ahead after looking at its library.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LibraryGate {
    Ready,
    Blocked(BlockReason),
}

#[derive(Default)]
struct CycleState {
    result: CycleResult,
    prompt_shown: bool,
    attempted: BTreeMap<String, (VersionCode, InstallOutcome)>,
    /// Library verdicts that hold for every dependent this cycle.
    library_blocks: BTreeMap<String, BlockReason>,
}

impl CycleState {
    fn block(
        &mut self,
        package: &str,
        version_code: VersionCode,
        library: &str,
        reason: BlockReason,
    ) {
        info!(
            package,
            version_code = %version_code,
            library,
            reason = %reason,
            "dependent update held back"
        );
        self.result.blocked.push(BlockedPackage {
            package: package.to_string(),
            version_code,
            library: library.to_string(),
            reason,
        });
    }
}

impl UpdateOrchestrator {
    pub fn new(
        sessions: Arc<SessionManager>,
        selector: Arc<dyn UpdateSelector>,
        libraries: Arc<dyn LibraryInspector>,
        notifier: Arc<dyn AttentionNotifier>,
        policy: DependencyPolicy,
    ) -> Self {
        Self {
            sessions,
            selector,
            libraries,
            notifier,
            policy,
        }
    }

    pub async fn run_cycle(&self, catalog: &Catalog) -> CycleResult {
        self.run_cycle_with_cancel(catalog, &CancellationToken::new())
            .await
    }

    /// Runs one cycle. Cancellation is honoured between installs; an install
    /// already handed to the session manager always completes.
    pub async fn run_cycle_with_cancel(
        &self,
        catalog: &Catalog,
        cancel: &CancellationToken,
    ) -> CycleResult {
        let mut state = CycleState::default();
        info!(
            timestamp = catalog.timestamp,
            packages = catalog.packages.len(),
            "starting update cycle"
        );

        for package in &catalog.packages {
            if state.result.cancelled || cancel.is_cancelled() {
                state.result.cancelled = true;
                info!("update cycle cancelled");
                break;
            }
            self.process_package(catalog, package, &mut state, cancel)
                .await;
        }

        if state.result.needs_user_attention {
            self.notifier.show_confirmation_required();
        } else if state.prompt_shown {
            debug!("confirmation prompt on screen, keeping open transactions");
        } else if state.result.cancelled {
            debug!("cycle cancelled, keeping open transactions");
        } else {
            self.sessions.abandon_stale_sessions().await;
        }

        let result = state.result;
        info!(
            retry = result.retry,
            needs_user_attention = result.needs_user_attention,
            attempts = result.attempts.len(),
            blocked = result.blocked.len(),
            "update cycle finished"
        );
        result
    }

    async fn process_package(
        &self,
        catalog: &Catalog,
        package: &PackageRecord,
        state: &mut CycleState,
        cancel: &CancellationToken,
    ) {
        let name = package.name.as_str();
        if state.attempted.contains_key(name) {
            debug!(package = name, "already attempted this cycle");
            return;
        }
        if self.sessions.has_active_confirmation(name).await {
            info!(package = name, "update still waits for user confirmation");
            state.result.needs_user_attention = true;
            return;
        }
        let Some(installed) = package.installed else {
            debug!(package = name, "not installed, nothing to update");
            return;
        };
        let Some(candidate) = self.selector.suggest(Some(installed), &package.versions) else {
            debug!(package = name, installed = %installed, "no update available");
            return;
        };

        if let Some(library) = self.policy.library_for(name, candidate) {
            let gate = self
                .resolve_library(catalog, library, candidate.version_code, state)
                .await;
            if let LibraryGate::Blocked(reason) = gate {
                state.block(name, candidate.version_code, library, reason);
                return;
            }
            if cancel.is_cancelled() {
                info!(package = name, library, "cancelled before installing dependent");
                state.result.cancelled = true;
                return;
            }
        }

        self.install_and_record(name, candidate, state).await;
    }

    /// Makes sure `library` provides at least `required`, installing it first
    /// when the catalog offers a high enough version.
    async fn resolve_library(
        &self,
        catalog: &Catalog,
        library: &str,
        required: VersionCode,
        state: &mut CycleState,
    ) -> LibraryGate {
        if let Some((version_code, outcome)) = state.attempted.get(library).cloned() {
            return Self::gate_from_attempt(library, version_code, &outcome, required, state);
        }
        if let Some(reason) = state.library_blocks.get(library) {
            return LibraryGate::Blocked(reason.clone());
        }

        match self.libraries.shared_library_version(library) {
            Ok(Some(current)) if current >= required => {
                debug!(
                    library,
                    current = %current,
                    required = %required,
                    "library already satisfies dependent"
                );
                return LibraryGate::Ready;
            }
            Ok(current) => {
                let current = current
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "none".to_string());
                debug!(library, %current, required = %required, "library must be updated first");
            }
            Err(err) => {
                warn!(library, error = %format!("{err:#}"), "failed inspecting shared library");
                let reason = BlockReason::InspectionFailed(format!("{err:#}"));
                state.result.retry = true;
                state.library_blocks.insert(library.to_string(), reason.clone());
                return LibraryGate::Blocked(reason);
            }
        }

        if self.sessions.has_active_confirmation(library).await {
            state.result.needs_user_attention = true;
            let reason = BlockReason::DependencyAwaitingUser;
            state.library_blocks.insert(library.to_string(), reason.clone());
            return LibraryGate::Blocked(reason);
        }

        let candidate = match catalog.package(library) {
            None => Err("library is not in the catalog".to_string()),
            Some(record) => match self.selector.suggest(None, &record.versions) {
                None => Err("no compatible library version available".to_string()),
                Some(candidate) if candidate.version_code < required => Err(format!(
                    "best library version {} is below required {}",
                    candidate.version_code, required
                )),
                Some(candidate) => Ok(candidate),
            },
        };
        let candidate = match candidate {
            Ok(candidate) => candidate,
            Err(reason) => {
                state.result.retry = true;
                return LibraryGate::Blocked(BlockReason::DependencyUnmet(reason));
            }
        };

        info!(
            library,
            version_code = %candidate.version_code,
            required = %required,
            "installing shared library ahead of dependent"
        );
        let outcome = self.install_and_record(library, candidate, state).await;
        Self::gate_from_attempt(library, candidate.version_code, &outcome, required, state)
    }

    fn gate_from_attempt(
        library: &str,
        version_code: VersionCode,
        outcome: &InstallOutcome,
        required: VersionCode,
        state: &mut CycleState,
    ) -> LibraryGate {
        match outcome {
            InstallOutcome::Success if version_code >= required => LibraryGate::Ready,
            InstallOutcome::Success => {
                state.result.retry = true;
                LibraryGate::Blocked(BlockReason::DependencyUnmet(format!(
                    "library {library} reached {version_code} this cycle, below required {required}"
                )))
            }
            InstallOutcome::ConfirmationPending(_) | InstallOutcome::PromptShown(_) => {
                LibraryGate::Blocked(BlockReason::DependencyAwaitingUser)
            }
            InstallOutcome::TransientFailure(_) | InstallOutcome::PermanentFailure(_) => {
                state.result.retry = true;
                LibraryGate::Blocked(BlockReason::DependencyFailed(outcome.clone()))
            }
        }
    }

    async fn install_and_record(
        &self,
        package: &str,
        version: &PackageVersion,
        state: &mut CycleState,
    ) -> InstallOutcome {
        let outcome = self.sessions.install(package, version).await;
        match &outcome {
            InstallOutcome::Success => {
                info!(package, version = %version.display_name(), "update installed");
            }
            InstallOutcome::PermanentFailure(reason) => {
                warn!(package, version_code = %version.version_code, %reason, "update rejected");
            }
            InstallOutcome::TransientFailure(reason) => {
                warn!(
                    package,
                    version_code = %version.version_code,
                    %reason,
                    "update failed, will retry"
                );
                state.result.retry = true;
            }
            InstallOutcome::ConfirmationPending(transaction_id) => {
                info!(package, %transaction_id, "update needs user confirmation");
                state.result.needs_user_attention = true;
            }
            InstallOutcome::PromptShown(transaction_id) => {
                info!(package, %transaction_id, "confirmation prompt shown");
                state.prompt_shown = true;
            }
        }

        state.attempted.insert(
            package.to_string(),
            (version.version_code, outcome.clone()),
        );
        state.result.attempts.push(InstallAttempt {
            package: package.to_string(),
            version_code: version.version_code,
            outcome: outcome.clone(),
        });
        outcome
    }
}
