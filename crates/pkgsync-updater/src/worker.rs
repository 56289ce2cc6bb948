use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use pkgsync_core::{CatalogProvider, CycleResult};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RetryConfig;
use crate::orchestrator::UpdateOrchestrator;
use crate::settings::{SettingsStore, UpdateSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkTrigger {
    /// Scheduled run; skipped when the catalog did not change since the last
    /// complete cycle.
    Periodic,
    /// Requested by the user; always runs a cycle.
    Manual,
}

/// Verdict handed back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkResult {
    Success,
    Retry { after: Duration },
    Cancelled,
}

pub struct UpdateWorker {
    provider: Arc<dyn CatalogProvider>,
    orchestrator: Arc<UpdateOrchestrator>,
    settings: SettingsStore,
    retry: RetryConfig,
}

impl UpdateWorker {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        orchestrator: Arc<UpdateOrchestrator>,
        settings: SettingsStore,
        retry: RetryConfig,
    ) -> Self {
        Self {
            provider,
            orchestrator,
            settings,
            retry,
        }
    }

    pub async fn run(&self, trigger: WorkTrigger, cancel: &CancellationToken) -> WorkResult {
        let mut settings = self.load_settings();

        let catalog = match self.provider.catalog().await {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to obtain catalog, cycle aborted");
                return self.schedule_retry(&mut settings);
            }
        };
        settings.last_checked_unix = Some(current_unix_timestamp());

        if trigger == WorkTrigger::Periodic {
            if let Some(last) = settings.last_catalog_timestamp {
                if catalog.timestamp <= last {
                    debug!(
                        timestamp = catalog.timestamp,
                        last, "catalog unchanged since last complete cycle"
                    );
                    self.store_settings(&settings);
                    return WorkResult::Success;
                }
            }
        }

        let result = self
            .orchestrator
            .run_cycle_with_cancel(&catalog, cancel)
            .await;
        self.settle(&result, catalog.timestamp, &mut settings)
    }

    fn settle(
        &self,
        result: &CycleResult,
        catalog_timestamp: u64,
        settings: &mut UpdateSettings,
    ) -> WorkResult {
        if result.retry {
            return self.schedule_retry(settings);
        }
        if result.cancelled {
            self.store_settings(settings);
            return WorkResult::Cancelled;
        }

        settings.last_catalog_timestamp = Some(catalog_timestamp);
        settings.consecutive_retries = 0;
        self.store_settings(settings);
        WorkResult::Success
    }

    fn schedule_retry(&self, settings: &mut UpdateSettings) -> WorkResult {
        settings.consecutive_retries = settings.consecutive_retries.saturating_add(1);
        let after = self.retry.backoff_for(settings.consecutive_retries);
        info!(
            attempt = settings.consecutive_retries,
            after_secs = after.as_secs(),
            "scheduling retry"
        );
        self.store_settings(settings);
        WorkResult::Retry { after }
    }

    fn load_settings(&self) -> UpdateSettings {
        match self.settings.load() {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "ignoring unreadable settings");
                UpdateSettings::default()
            }
        }
    }

    fn store_settings(&self, settings: &UpdateSettings) {
        if let Err(err) = self.settings.save(settings) {
            warn!(error = %format!("{err:#}"), "failed to persist settings");
        }
    }
}

pub(crate) fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
