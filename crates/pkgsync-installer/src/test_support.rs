//! Recording doubles for the installer collaborators.
//!
//! Every double can share one [`EventLog`] so tests can assert the order in
//! which fetches, installs, prompts and abandons happened.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use pkgsync_core::{
    AttentionNotifier, ConfirmationHandle, ConfirmationPresenter, InstallOptions, Installer,
    InstallerResponse, PackageVersion, PayloadFetcher, TransactionId, TransactionInfo,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Fetch(String),
    Install(String),
    Abandon(TransactionId),
    Present(String, TransactionId),
    ShowNotification,
    CancelNotification,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Packages handed to the installer, in call order.
    pub fn installs(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Install(package) => Some(package.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| *event == wanted)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// What the scripted installer answers for a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Installed,
    Rejected(i32),
    ConfirmationRequired,
    Error(String),
}

pub struct RecordingInstaller {
    log: EventLog,
    responses: Mutex<BTreeMap<String, Scripted>>,
    live: Mutex<Vec<TransactionInfo>>,
    options: Mutex<Vec<InstallOptions>>,
    fail_listing: AtomicBool,
    next_transaction: AtomicU64,
}

impl RecordingInstaller {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            responses: Mutex::new(BTreeMap::new()),
            live: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
            fail_listing: AtomicBool::new(false),
            next_transaction: AtomicU64::new(100),
        }
    }

    /// Packages without a scripted answer install successfully.
    pub fn respond(&self, package: &str, response: Scripted) {
        self.responses.lock().insert(package.to_string(), response);
    }

    /// Adds a committed and sealed transaction, as a crashed run would leave it.
    pub fn add_sealed_transaction(&self, id: u64, package: Option<&str>) {
        self.add_transaction(TransactionInfo {
            id: TransactionId(id),
            package: package.map(str::to_string),
            committed: true,
            sealed: true,
        });
    }

    pub fn add_transaction(&self, info: TransactionInfo) {
        self.live.lock().push(info);
    }

    pub fn live(&self) -> Vec<TransactionInfo> {
        self.live.lock().clone()
    }

    pub fn seen_options(&self) -> Vec<InstallOptions> {
        self.options.lock().clone()
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Installer for RecordingInstaller {
    async fn install(
        &self,
        package: &str,
        _payload: &Path,
        options: &InstallOptions,
    ) -> Result<InstallerResponse> {
        self.log.push(Event::Install(package.to_string()));
        self.options.lock().push(*options);

        let scripted = self
            .responses
            .lock()
            .get(package)
            .cloned()
            .unwrap_or(Scripted::Installed);
        match scripted {
            Scripted::Installed => Ok(InstallerResponse::Installed),
            Scripted::Rejected(status) => Ok(InstallerResponse::Rejected {
                status,
                message: Some("scripted rejection".to_string()),
            }),
            Scripted::Error(message) => Err(anyhow!(message)),
            Scripted::ConfirmationRequired => {
                let id = TransactionId(self.next_transaction.fetch_add(1, Ordering::SeqCst));
                self.live.lock().push(TransactionInfo {
                    id,
                    package: Some(package.to_string()),
                    committed: true,
                    sealed: true,
                });
                let inner = Arc::new(format!("confirm:{package}"));
                Ok(InstallerResponse::ConfirmationRequired(
                    ConfirmationHandle::new(id, inner),
                ))
            }
        }
    }

    async fn live_transactions(&self) -> Result<Vec<TransactionInfo>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(anyhow!("transaction listing unavailable"));
        }
        Ok(self.live.lock().clone())
    }

    async fn abandon(&self, id: TransactionId) -> Result<()> {
        self.log.push(Event::Abandon(id));
        self.live.lock().retain(|info| info.id != id);
        Ok(())
    }
}

/// Fetcher that writes payload bytes into a directory, or hands out paths
/// that do not exist when no directory is given.
pub struct StaticFetcher {
    log: EventLog,
    dir: Option<PathBuf>,
    contents: Mutex<BTreeMap<String, Vec<u8>>>,
    failing: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn in_dir(dir: &Path, log: EventLog) -> Self {
        Self {
            log,
            dir: Some(dir.to_path_buf()),
            contents: Mutex::new(BTreeMap::new()),
            failing: Mutex::new(Vec::new()),
        }
    }

    pub fn virtual_files(log: EventLog) -> Self {
        Self {
            log,
            dir: None,
            contents: Mutex::new(BTreeMap::new()),
            failing: Mutex::new(Vec::new()),
        }
    }

    pub fn set_contents(&self, package: &str, bytes: &[u8]) {
        self.contents
            .lock()
            .insert(package.to_string(), bytes.to_vec());
    }

    pub fn fail_for(&self, package: &str) {
        self.failing.lock().push(package.to_string());
    }
}

#[async_trait]
impl PayloadFetcher for StaticFetcher {
    async fn fetch(&self, package: &str, version: &PackageVersion) -> Result<PathBuf> {
        self.log.push(Event::Fetch(package.to_string()));
        if self.failing.lock().iter().any(|name| name == package) {
            return Err(anyhow!("connection reset while downloading {package}"));
        }

        let Some(dir) = &self.dir else {
            return Ok(PathBuf::from("/nonexistent/pkgsync").join(&version.payload.name));
        };
        let path = dir.join(&version.payload.name);
        let bytes = self
            .contents
            .lock()
            .get(package)
            .cloned()
            .unwrap_or_else(|| format!("{package}:{}", version.version_code).into_bytes());
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed writing payload {}", path.display()))?;
        Ok(path)
    }
}

pub struct RecordingPresenter {
    log: EventLog,
    presented: Mutex<Vec<(String, ConfirmationHandle)>>,
}

impl RecordingPresenter {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            presented: Mutex::new(Vec::new()),
        }
    }

    pub fn presented(&self) -> Vec<(String, ConfirmationHandle)> {
        self.presented.lock().clone()
    }
}

impl ConfirmationPresenter for RecordingPresenter {
    fn present(&self, package: &str, handle: &ConfirmationHandle) {
        self.log
            .push(Event::Present(package.to_string(), handle.transaction_id()));
        self.presented
            .lock()
            .push((package.to_string(), handle.clone()));
    }
}

pub struct RecordingNotifier {
    log: EventLog,
}

impl RecordingNotifier {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl AttentionNotifier for RecordingNotifier {
    fn show_confirmation_required(&self) {
        self.log.push(Event::ShowNotification);
    }

    fn cancel_confirmation_required(&self) {
        self.log.push(Event::CancelNotification);
    }
}
