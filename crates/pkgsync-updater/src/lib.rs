mod config;
mod orchestrator;
mod settings;
mod worker;

pub use config::{LoggingConfig, RetryConfig, UpdaterConfig};
pub use orchestrator::UpdateOrchestrator;
pub use settings::{SettingsStore, UpdateSettings};
pub use worker::{UpdateWorker, WorkResult, WorkTrigger};
