use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use pkgsync_installer::SessionConfig;
use pkgsync_resolver::{DependencyConstraint, DependencyPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    #[serde(default = "config_version")]
    pub version: u32,
    #[serde(default)]
    pub dependencies: Vec<DependencyConstraint>,
    #[serde(default)]
    pub install: SessionConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            version: config_version(),
            dependencies: Vec::new(),
            install: SessionConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based): doubles each time, capped.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1_u64.checked_shl(exponent).unwrap_or(u64::MAX);
        let secs = self
            .initial_backoff_secs
            .saturating_mul(factor)
            .min(self.max_backoff_secs);
        Duration::from_secs(secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
}

impl UpdaterConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("failed parsing updater config")?;
        let expected = config_version();
        if config.version != expected {
            anyhow::bail!(
                "unsupported updater config version {} (expected {}): update the config file to version {}",
                config.version,
                expected,
                expected
            );
        }
        if config.retry.initial_backoff_secs == 0 {
            anyhow::bail!("retry.initial_backoff_secs must be greater than zero");
        }
        if config.retry.max_backoff_secs < config.retry.initial_backoff_secs {
            anyhow::bail!("retry.max_backoff_secs must not be below retry.initial_backoff_secs");
        }
        config.dependency_policy()?;
        Ok(config)
    }

    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .with_context(|| format!("failed loading updater config: {}", path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err)
                .with_context(|| format!("failed reading updater config: {}", path.display())),
        }
    }

    pub fn dependency_policy(&self) -> Result<DependencyPolicy> {
        DependencyPolicy::from_constraints(&self.dependencies)
            .context("invalid dependency configuration")
    }
}

fn config_version() -> u32 {
    1
}

fn default_initial_backoff_secs() -> u64 {
    30
}

fn default_max_backoff_secs() -> u64 {
    5 * 60 * 60
}
